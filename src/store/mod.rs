pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{UserId, UserWordProgress, Word, WordId};

pub use memory::MemoryProgressStore;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("progress store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Durable per-(user, word) progress plus the catalog queries the scheduler
/// needs. Every method is atomic at the row level.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Catalog words the user has no progress row for.
    async fn find_unseen(&self, user_id: UserId) -> Result<Vec<Word>, StoreError>;

    /// Words with a progress row whose `next_revise` is present and `<= now`.
    async fn find_due(&self, user_id: UserId, now: DateTime<Utc>)
        -> Result<Vec<Word>, StoreError>;

    /// Idempotent upsert keyed by (user, word). `is_custom` is taken from the
    /// word on first insertion only.
    async fn upsert_progress(
        &self,
        user_id: UserId,
        word: &Word,
        level: u32,
        next_revise: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Marks the word fully learned: `level + 1`, `next_revise` cleared.
    /// A user without a row for the word gets one at level 1.
    async fn bump_level_and_clear_revise(
        &self,
        user_id: UserId,
        word: &Word,
    ) -> Result<(), StoreError>;

    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<UserWordProgress>, StoreError>;
}
