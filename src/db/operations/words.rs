use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

use crate::db::DatabaseProxy;
use crate::models::Word;

#[derive(Debug, Error)]
pub enum WordError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("word already exists: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

pub(crate) fn map_word(row: &SqliteRow) -> Result<Word, sqlx::Error> {
    Ok(Word {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        translation: row.try_get("translation")?,
        is_custom: row.try_get("isCustom")?,
    })
}

pub async fn list_random_words(proxy: &DatabaseProxy, limit: i64) -> Result<Vec<Word>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "text", "translation", "isCustom"
        FROM "words"
        ORDER BY RANDOM()
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;

    rows.iter().map(map_word).collect()
}

pub async fn find_word_by_text(
    proxy: &DatabaseProxy,
    text: &str,
) -> Result<Option<Word>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id", "text", "translation", "isCustom" FROM "words" WHERE "text" = ? LIMIT 1"#,
    )
    .bind(text)
    .fetch_optional(proxy.pool())
    .await?;

    row.as_ref().map(map_word).transpose()
}

pub async fn count_words(proxy: &DatabaseProxy) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(proxy.pool())
        .await
}

/// Adds a user-contributed word to the catalog.
pub async fn create_custom_word(
    proxy: &DatabaseProxy,
    text: &str,
    translation: &str,
) -> Result<Word, WordError> {
    let text = text.trim();
    let translation = translation.trim();
    if text.is_empty() || translation.is_empty() {
        return Err(WordError::Validation(
            "word and translation must not be empty".to_string(),
        ));
    }

    if find_word_by_text(proxy, text).await?.is_some() {
        return Err(WordError::Duplicate(text.to_string()));
    }

    let result = sqlx::query(
        r#"INSERT INTO "words" ("text", "translation", "isCustom") VALUES (?, ?, 1)"#,
    )
    .bind(text)
    .bind(translation)
    .execute(proxy.pool())
    .await;

    match result {
        Ok(done) => Ok(Word {
            id: done.last_insert_rowid(),
            text: text.to_string(),
            translation: translation.to_string(),
            is_custom: true,
        }),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(WordError::Duplicate(text.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Inserts a seeded (non-custom) word, ignoring texts already present.
/// Returns whether a row was written.
pub async fn insert_seed_word(
    proxy: &DatabaseProxy,
    text: &str,
    translation: &str,
) -> Result<bool, sqlx::Error> {
    let done = sqlx::query(
        r#"INSERT OR IGNORE INTO "words" ("text", "translation", "isCustom") VALUES (?, ?, 0)"#,
    )
    .bind(text)
    .bind(translation)
    .execute(proxy.pool())
    .await?;

    Ok(done.rows_affected() > 0)
}
