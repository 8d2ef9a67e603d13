pub const SCHEMA_VERSION: &str = "1";

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "_db_metadata" (
    "key" TEXT PRIMARY KEY,
    "value" TEXT NOT NULL
);

-- master catalog of word pairs
CREATE TABLE IF NOT EXISTS "words" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "text" TEXT NOT NULL UNIQUE,
    "translation" TEXT NOT NULL,
    "isCustom" INTEGER NOT NULL DEFAULT 0
);

-- nextReviseAt holds unix millis and is NULL once the word is learned
CREATE TABLE IF NOT EXISTS "user_words" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "userId" INTEGER NOT NULL,
    "wordId" INTEGER NOT NULL REFERENCES "words" ("id"),
    "level" INTEGER NOT NULL DEFAULT 0,
    "nextReviseAt" INTEGER,
    "isCustom" INTEGER NOT NULL DEFAULT 0,
    UNIQUE ("userId", "wordId")
);

CREATE INDEX IF NOT EXISTS "user_words_due_idx" ON "user_words" ("userId", "nextReviseAt");
"#;

/// Splits a script on `;` outside of quoted sections and drops `--` comment
/// lines from each statement.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            ';' if !in_single_quote && !in_double_quote => {
                push_statement(&mut statements, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    let stmt = stmt.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}
