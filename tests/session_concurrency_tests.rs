use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use danci_repeat::models::{SessionMode, UserId, UserWordProgress, Word, WordId};
use danci_repeat::services::{AttemptOutcome, Scheduler, SessionManager};
use danci_repeat::store::{MemoryProgressStore, ProgressStore, StoreError};

mod common;

fn word(id: i64, text: &str, translation: &str) -> Word {
    Word {
        id,
        text: text.to_string(),
        translation: translation.to_string(),
        is_custom: false,
    }
}

fn memory_manager(words: Vec<Word>) -> (Arc<MemoryProgressStore>, Arc<SessionManager>) {
    let store = Arc::new(MemoryProgressStore::with_catalog(words));
    let manager = Arc::new(SessionManager::new(Scheduler::new(store.clone())));
    (store, manager)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_attempts_are_not_lost() {
    let (_store, manager) = memory_manager(vec![word(1, "casa", "house")]);
    manager.start_learn(1, Utc::now()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.record_attempt(1, &format!("wrong-{i}")).await.unwrap()
        }));
    }
    let attempts = futures::future::join_all(handles).await;

    let mut retries = 0;
    let mut exhausted = 0;
    let mut seen_left = Vec::new();
    for attempt in attempts {
        match attempt.unwrap().outcome {
            AttemptOutcome::IncorrectRetry { attempts_left } => {
                retries += 1;
                seen_left.push(attempts_left);
            }
            AttemptOutcome::IncorrectExhausted => exhausted += 1,
            AttemptOutcome::Correct => panic!("no submission was correct"),
        }
    }
    seen_left.sort_unstable();

    // some serial order: exactly two retries (2 then 1 left), the rest exhausted
    assert_eq!(retries, 2);
    assert_eq!(seen_left, vec![1, 2]);
    assert_eq!(exhausted, 14);
    assert_eq!(manager.snapshot(1).await.unwrap().wrong_attempts, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_hands_out_session_once() {
    let (_store, manager) = memory_manager(vec![word(1, "casa", "house")]);
    manager.start_learn(1, Utc::now()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { manager.resolve(1).await }));
    }
    let resolved = futures::future::join_all(handles)
        .await
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_some())
        .count();

    assert_eq!(resolved, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reissue_refreshes_the_same_word() {
    let (_store, manager) = memory_manager(vec![
        word(1, "casa", "house"),
        word(2, "perro", "dog"),
        word(3, "gato", "cat"),
    ]);
    let issued = manager.start_learn(1, Utc::now()).await.unwrap().unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .get_active_or_reissue(1, SessionMode::Learning, Utc::now())
                .await
                .unwrap()
                .unwrap()
        }));
    }

    for result in futures::future::join_all(handles).await {
        let again = result.unwrap();
        assert!(again.reused);
        assert_eq!(again.word, issued.word);
    }
}

/// Store whose unseen lookup blocks until released, to observe lock scope.
struct SlowStore {
    inner: MemoryProgressStore,
    slow_user: UserId,
    gate: tokio::sync::Notify,
}

#[async_trait]
impl ProgressStore for SlowStore {
    async fn find_unseen(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        if user_id == self.slow_user {
            self.gate.notified().await;
        }
        self.inner.find_unseen(user_id).await
    }

    async fn find_due(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<Word>, StoreError> {
        self.inner.find_due(user_id, now).await
    }

    async fn upsert_progress(
        &self,
        user_id: UserId,
        word: &Word,
        level: u32,
        next_revise: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.inner
            .upsert_progress(user_id, word, level, next_revise)
            .await
    }

    async fn bump_level_and_clear_revise(
        &self,
        user_id: UserId,
        word: &Word,
    ) -> Result<(), StoreError> {
        self.inner.bump_level_and_clear_revise(user_id, word).await
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        word_id: WordId,
    ) -> Result<Option<UserWordProgress>, StoreError> {
        self.inner.get_progress(user_id, word_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocked_user_does_not_block_other_users() {
    let store = Arc::new(SlowStore {
        inner: MemoryProgressStore::with_catalog(vec![word(1, "casa", "house")]),
        slow_user: 1,
        gate: tokio::sync::Notify::new(),
    });
    let manager = Arc::new(SessionManager::new(Scheduler::new(store.clone())));

    let blocked = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.start_learn(1, Utc::now()).await })
    };
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    let other = tokio::time::timeout(
        StdDuration::from_secs(2),
        manager.start_learn(2, Utc::now()),
    )
    .await
    .expect("second user was blocked by the first")
    .unwrap();
    assert!(other.is_some());

    // the same user's next event waits behind the outstanding operation
    let same_user = tokio::time::timeout(StdDuration::from_millis(50), manager.resolve(1)).await;
    assert!(same_user.is_err());

    store.gate.notify_one();
    let issued = blocked.await.unwrap().unwrap().unwrap();
    assert_eq!(issued.word.id, 1);
    assert_eq!(manager.snapshot(1).await.unwrap().word.id, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_backed_users_progress_independently() {
    let env = common::test_env(common::SAMPLE_WORDS);
    let proxy = common::open_seeded(&env).await;
    let manager = Arc::new(SessionManager::new(Scheduler::new(proxy.clone())));
    let now = Utc::now();

    let mut handles = Vec::new();
    for user_id in 1..=8_i64 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            for _ in 0..common::SAMPLE_WORDS.len() {
                let issued = manager.start_learn(user_id, now).await?.expect("word available");
                assert_eq!(issued.mode, SessionMode::Learning);
                manager.resolve_and_commit(user_id, false, now).await?;
            }
            manager.start_learn(user_id, now).await
        }));
    }

    for result in futures::future::join_all(handles).await {
        assert_eq!(result.unwrap().unwrap(), None);
    }

    for user_id in 1..=8_i64 {
        assert!(proxy.find_unseen(user_id).await.unwrap().is_empty());
        let due_later = proxy
            .find_due(user_id, now + chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(due_later.len(), common::SAMPLE_WORDS.len());
    }
}
