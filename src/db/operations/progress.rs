use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::db::operations::words::map_word;
use crate::db::DatabaseProxy;
use crate::models::{from_millis, to_millis, UserId, UserWordProgress, Word, WordId};
use crate::store::{ProgressStore, StoreError};

pub async fn select_unseen_words(
    proxy: &DatabaseProxy,
    user_id: UserId,
) -> Result<Vec<Word>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT w."id", w."text", w."translation", w."isCustom"
        FROM "words" w
        WHERE NOT EXISTS (
            SELECT 1 FROM "user_words" uw
            WHERE uw."userId" = ? AND uw."wordId" = w."id"
        )
        "#,
    )
    .bind(user_id)
    .fetch_all(proxy.pool())
    .await?;

    rows.iter().map(map_word).collect()
}

pub async fn select_due_words(
    proxy: &DatabaseProxy,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<Vec<Word>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT w."id", w."text", w."translation", w."isCustom"
        FROM "words" w
        INNER JOIN "user_words" uw ON uw."wordId" = w."id"
        WHERE uw."userId" = ?
          AND uw."nextReviseAt" IS NOT NULL
          AND uw."nextReviseAt" <= ?
        "#,
    )
    .bind(user_id)
    .bind(to_millis(now))
    .fetch_all(proxy.pool())
    .await?;

    rows.iter().map(map_word).collect()
}

pub async fn upsert_user_word(
    proxy: &DatabaseProxy,
    user_id: UserId,
    word: &Word,
    level: u32,
    next_revise: Option<DateTime<Utc>>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "user_words" ("userId", "wordId", "level", "nextReviseAt", "isCustom")
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT ("userId", "wordId")
        DO UPDATE SET "level" = excluded."level", "nextReviseAt" = excluded."nextReviseAt"
        "#,
    )
    .bind(user_id)
    .bind(word.id)
    .bind(i64::from(level))
    .bind(next_revise.map(to_millis))
    .bind(word.is_custom)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn mark_user_word_learned(
    proxy: &DatabaseProxy,
    user_id: UserId,
    word: &Word,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "user_words" ("userId", "wordId", "level", "nextReviseAt", "isCustom")
        VALUES (?, ?, 1, NULL, ?)
        ON CONFLICT ("userId", "wordId")
        DO UPDATE SET "level" = "user_words"."level" + 1, "nextReviseAt" = NULL
        "#,
    )
    .bind(user_id)
    .bind(word.id)
    .bind(word.is_custom)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn select_user_word(
    proxy: &DatabaseProxy,
    user_id: UserId,
    word_id: WordId,
) -> Result<Option<UserWordProgress>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "userId", "wordId", "level", "nextReviseAt", "isCustom"
        FROM "user_words"
        WHERE "userId" = ? AND "wordId" = ?
        "#,
    )
    .bind(user_id)
    .bind(word_id)
    .fetch_optional(proxy.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let level: i64 = row.try_get("level")?;
    let next_revise: Option<i64> = row.try_get("nextReviseAt")?;
    Ok(Some(UserWordProgress {
        user_id: row.try_get("userId")?,
        word_id: row.try_get("wordId")?,
        level: u32::try_from(level.max(0)).unwrap_or(u32::MAX),
        next_revise: next_revise.map(from_millis),
        is_custom: row.try_get("isCustom")?,
    }))
}

pub async fn count_user_words(proxy: &DatabaseProxy, user_id: UserId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user_words" WHERE "userId" = ?"#)
        .bind(user_id)
        .fetch_one(proxy.pool())
        .await
}

#[async_trait]
impl ProgressStore for DatabaseProxy {
    async fn find_unseen(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        Ok(select_unseen_words(self, user_id).await?)
    }

    async fn find_due(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Word>, StoreError> {
        Ok(select_due_words(self, user_id, now).await?)
    }

    async fn upsert_progress(
        &self,
        user_id: UserId,
        word: &Word,
        level: u32,
        next_revise: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        Ok(upsert_user_word(self, user_id, word, level, next_revise).await?)
    }

    async fn bump_level_and_clear_revise(
        &self,
        user_id: UserId,
        word: &Word,
    ) -> Result<(), StoreError> {
        Ok(mark_user_word_learned(self, user_id, word).await?)
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<UserWordProgress>, StoreError> {
        Ok(select_user_word(self, user_id, word_id).await?)
    }
}
