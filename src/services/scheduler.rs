use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{UserId, Word};
use crate::services::interval::{FixedInterval, IntervalPolicy};
use crate::store::{ProgressStore, StoreError};

/// Chooses the next word for a user and writes answered outcomes back to
/// the progress store. Holds no per-user state of its own.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn ProgressStore>,
    policy: Arc<dyn IntervalPolicy>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self::with_policy(store, Arc::new(FixedInterval::default()))
    }

    pub fn with_policy(store: Arc<dyn ProgressStore>, policy: Arc<dyn IntervalPolicy>) -> Self {
        Self { store, policy }
    }

    pub async fn pick_unseen_word(&self, user_id: UserId) -> Result<Option<Word>, StoreError> {
        let candidates = self.store.find_unseen(user_id).await?;
        let picked = pick_uniform(candidates);
        tracing::debug!(
            user_id,
            word_id = picked.as_ref().map(|w| w.id),
            "picked unseen word"
        );
        Ok(picked)
    }

    pub async fn pick_due_word(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Word>, StoreError> {
        let candidates = self.store.find_due(user_id, now).await?;
        let due = candidates.len();
        let picked = pick_uniform(candidates);
        tracing::debug!(
            user_id,
            due,
            word_id = picked.as_ref().map(|w| w.id),
            "picked due word"
        );
        Ok(picked)
    }

    pub async fn commit_outcome(
        &self,
        user_id: UserId,
        word: &Word,
        mark_fully_learned: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if mark_fully_learned {
            self.store.bump_level_and_clear_revise(user_id, word).await?;
            tracing::info!(user_id, word_id = word.id, "word marked as learned");
            return Ok(());
        }

        let level = 0;
        let next_revise = self.policy.next_revise(level, now);
        self.store
            .upsert_progress(user_id, word, level, Some(next_revise))
            .await?;
        tracing::info!(
            user_id,
            word_id = word.id,
            next_revise = %next_revise.to_rfc3339(),
            "word scheduled for revision"
        );
        Ok(())
    }
}

fn pick_uniform(mut words: Vec<Word>) -> Option<Word> {
    if words.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..words.len());
    Some(words.swap_remove(idx))
}
