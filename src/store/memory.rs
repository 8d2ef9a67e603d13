use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::models::{UserId, UserWordProgress, Word, WordId};
use crate::store::{ProgressStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    catalog: Vec<Word>,
    progress: HashMap<(UserId, WordId), UserWordProgress>,
}

/// In-process store. Can be switched offline to exercise the
/// `StoreError::Unavailable` paths.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(words: impl IntoIterator<Item = Word>) -> Self {
        let store = Self::new();
        for word in words {
            store.add_word(word);
        }
        store
    }

    pub fn add_word(&self, word: Word) {
        let mut tables = self.tables.write();
        if tables.catalog.iter().any(|w| w.id == word.id || w.text == word.text) {
            return;
        }
        tables.catalog.push(word);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn progress_rows(&self, user_id: UserId) -> Vec<UserWordProgress> {
        let tables = self.tables.read();
        let mut rows: Vec<_> = tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.word_id);
        rows
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn find_unseen(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read();
        Ok(tables
            .catalog
            .iter()
            .filter(|w| !tables.progress.contains_key(&(user_id, w.id)))
            .cloned()
            .collect())
    }

    async fn find_due(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Word>, StoreError> {
        self.ensure_online()?;
        let tables = self.tables.read();
        Ok(tables
            .catalog
            .iter()
            .filter(|w| {
                tables
                    .progress
                    .get(&(user_id, w.id))
                    .is_some_and(|p| p.is_due(now))
            })
            .cloned()
            .collect())
    }

    async fn upsert_progress(
        &self,
        user_id: UserId,
        word: &Word,
        level: u32,
        next_revise: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut tables = self.tables.write();
        let row = tables
            .progress
            .entry((user_id, word.id))
            .or_insert_with(|| UserWordProgress {
                user_id,
                word_id: word.id,
                level,
                next_revise,
                is_custom: word.is_custom,
            });
        row.level = level;
        row.next_revise = next_revise;
        Ok(())
    }

    async fn bump_level_and_clear_revise(
        &self,
        user_id: UserId,
        word: &Word,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut tables = self.tables.write();
        tables
            .progress
            .entry((user_id, word.id))
            .and_modify(|row| {
                row.level = row.level.saturating_add(1);
                row.next_revise = None;
            })
            .or_insert_with(|| UserWordProgress {
                user_id,
                word_id: word.id,
                level: 1,
                next_revise: None,
                is_custom: word.is_custom,
            });
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<UserWordProgress>, StoreError> {
        self.ensure_online()?;
        Ok(self.tables.read().progress.get(&(user_id, word_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn word(id: WordId, text: &str) -> Word {
        Word {
            id,
            text: text.to_string(),
            translation: format!("{text}-tr"),
            is_custom: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_catalog_text_is_ignored() {
        let store = MemoryProgressStore::with_catalog([word(1, "casa"), word(2, "casa")]);
        assert_eq!(store.find_unseen(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row() {
        let store = MemoryProgressStore::with_catalog([word(1, "casa")]);
        let w = word(1, "casa");
        let now = Utc::now();
        store.upsert_progress(7, &w, 0, Some(now)).await.unwrap();
        store
            .upsert_progress(7, &w, 0, Some(now + Duration::hours(1)))
            .await
            .unwrap();

        let rows = store.progress_rows(7);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].next_revise, Some(now + Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_bump_creates_learned_row_when_missing() {
        let store = MemoryProgressStore::with_catalog([word(1, "casa")]);
        store
            .bump_level_and_clear_revise(7, &word(1, "casa"))
            .await
            .unwrap();

        let row = store.get_progress(7, 1).await.unwrap().unwrap();
        assert_eq!(row.level, 1);
        assert_eq!(row.next_revise, None);
        assert!(store.find_unseen(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = MemoryProgressStore::with_catalog([word(1, "casa")]);
        store.set_offline(true);
        assert!(matches!(
            store.find_unseen(7).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
