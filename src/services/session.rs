use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{SessionMode, UserId, Word};
use crate::services::scheduler::Scheduler;
use crate::store::StoreError;

pub const DEFAULT_STALE_AFTER_MINUTES: i64 = 30;
pub const MAX_ATTEMPTS: u8 = 3;
const MAX_WRONG_ATTEMPTS: u8 = MAX_ATTEMPTS - 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub word: Word,
    pub mode: SessionMode,
    pub issued_at: DateTime<Utc>,
    pub wrong_attempts: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Active(ChatSession),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedWord {
    pub word: Word,
    pub mode: SessionMode,
    /// The word was already outstanding and has only been refreshed.
    pub reused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Correct,
    IncorrectRetry { attempts_left: u8 },
    IncorrectExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub outcome: AttemptOutcome,
    /// Session as it stands after the attempt was recorded.
    pub session: ChatSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no active session")]
pub struct SessionNotFound;

type Slot = Arc<Mutex<SessionState>>;

/// Per-user session slots. The outer map is only locked to look up, create
/// or drop a slot; all session reads and writes happen under the slot lock.
/// Only slots that hold an active session or are in use stay in the map.
#[derive(Default)]
struct SessionTable {
    slots: parking_lot::Mutex<HashMap<UserId, Slot>>,
}

impl SessionTable {
    fn slot(&self, user_id: UserId) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(user_id).or_default())
    }

    fn existing(&self, user_id: UserId) -> Option<Slot> {
        self.slots.lock().get(&user_id).cloned()
    }

    /// Drops the user's slot when it is idle and `slot` is the last handle
    /// besides the map's own. New handles are only taken under the table
    /// lock, so nobody can pick the slot up while it is being removed.
    fn release(&self, user_id: UserId, slot: Slot) {
        let mut slots = self.slots.lock();
        let Some(current) = slots.get(&user_id) else {
            return;
        };
        if !Arc::ptr_eq(current, &slot) || Arc::strong_count(&slot) > 2 {
            return;
        }
        if matches!(slot.try_lock().as_deref(), Ok(SessionState::Idle)) {
            slots.remove(&user_id);
        }
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Slots locked by an in-flight operation are not counted.
    fn active(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot.try_lock().as_deref(), Ok(SessionState::Active(_))))
            .count()
    }
}

/// Serializes one outstanding quiz per user. Every operation that reads and
/// then updates a session holds that user's slot lock for its whole duration,
/// scheduler I/O included. Different users never share a lock.
pub struct SessionManager {
    scheduler: Scheduler,
    table: SessionTable,
    stale_after: Duration,
}

impl SessionManager {
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_stale_after(scheduler, Duration::minutes(DEFAULT_STALE_AFTER_MINUTES))
    }

    pub fn with_stale_after(scheduler: Scheduler, stale_after: Duration) -> Self {
        Self {
            scheduler,
            table: SessionTable::default(),
            stale_after,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Chats that currently hold a slot.
    pub fn tracked_users(&self) -> usize {
        self.table.len()
    }

    pub fn active_sessions(&self) -> usize {
        self.table.active()
    }

    pub async fn start_revise(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedWord>, StoreError> {
        self.start(user_id, SessionMode::Revising, now).await
    }

    pub async fn start_learn(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedWord>, StoreError> {
        self.start(user_id, SessionMode::Learning, now).await
    }

    /// Returns the outstanding word when it is still fresh and was issued in
    /// `mode`; otherwise discards it (attempt count included) and issues a
    /// new one.
    pub async fn get_active_or_reissue(
        &self,
        user_id: UserId,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedWord>, StoreError> {
        let slot = self.table.slot(user_id);
        let issued = {
            let mut state = slot.lock().await;
            match self.refresh(user_id, &mut state, mode, now) {
                Some(issued) => Ok(Some(issued)),
                None => self.issue(user_id, &mut state, mode, now).await,
            }
        };
        self.table.release(user_id, slot);
        issued
    }

    pub async fn record_attempt(
        &self,
        user_id: UserId,
        submitted: &str,
    ) -> Result<Attempt, SessionNotFound> {
        let slot = self.table.existing(user_id).ok_or(SessionNotFound)?;
        let mut state = slot.lock().await;
        let SessionState::Active(session) = &mut *state else {
            return Err(SessionNotFound);
        };

        let outcome = if session.wrong_attempts >= MAX_WRONG_ATTEMPTS {
            AttemptOutcome::IncorrectExhausted
        } else if answer_matches(submitted, &session.word.text) {
            AttemptOutcome::Correct
        } else {
            session.wrong_attempts += 1;
            AttemptOutcome::IncorrectRetry {
                attempts_left: MAX_ATTEMPTS - session.wrong_attempts,
            }
        };

        tracing::debug!(
            user_id,
            word_id = session.word.id,
            wrong_attempts = session.wrong_attempts,
            outcome = ?outcome,
            "attempt recorded"
        );

        Ok(Attempt {
            outcome,
            session: session.clone(),
        })
    }

    pub async fn resolve(&self, user_id: UserId) -> Option<ChatSession> {
        let slot = self.table.existing(user_id)?;
        let resolved = match std::mem::take(&mut *slot.lock().await) {
            SessionState::Active(session) => Some(session),
            SessionState::Idle => None,
        };
        self.table.release(user_id, slot);
        resolved
    }

    /// Resolves the session and commits its outcome while still holding the
    /// user's lock. When the commit fails the session is put back untouched.
    pub async fn resolve_and_commit(
        &self,
        user_id: UserId,
        mark_fully_learned: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<ChatSession>, StoreError> {
        let Some(slot) = self.table.existing(user_id) else {
            return Ok(None);
        };
        let committed = {
            let mut state = slot.lock().await;
            match std::mem::take(&mut *state) {
                SessionState::Idle => Ok(None),
                SessionState::Active(session) => match self
                    .scheduler
                    .commit_outcome(user_id, &session.word, mark_fully_learned, now)
                    .await
                {
                    Ok(()) => Ok(Some(session)),
                    Err(err) => {
                        tracing::warn!(
                            user_id,
                            word_id = session.word.id,
                            error = %err,
                            "commit failed, session restored"
                        );
                        *state = SessionState::Active(session);
                        Err(err)
                    }
                },
            }
        };
        self.table.release(user_id, slot);
        committed
    }

    pub async fn snapshot(&self, user_id: UserId) -> Option<ChatSession> {
        let slot = self.table.existing(user_id)?;
        let state = slot.lock().await;
        match &*state {
            SessionState::Active(session) => Some(session.clone()),
            SessionState::Idle => None,
        }
    }

    async fn start(
        &self,
        user_id: UserId,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedWord>, StoreError> {
        let slot = self.table.slot(user_id);
        let issued = {
            let mut state = slot.lock().await;
            self.issue(user_id, &mut state, mode, now).await
        };
        self.table.release(user_id, slot);
        issued
    }

    /// Keeps the outstanding word when it is fresh and in `mode`, moving
    /// `issued_at` to `now`. A session is stale once `stale_after` has fully
    /// elapsed.
    fn refresh(
        &self,
        user_id: UserId,
        state: &mut SessionState,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Option<IssuedWord> {
        let SessionState::Active(session) = state else {
            return None;
        };

        let stale = now - session.issued_at >= self.stale_after;
        if !stale && session.mode == mode {
            session.issued_at = now;
            return Some(IssuedWord {
                word: session.word.clone(),
                mode: session.mode,
                reused: true,
            });
        }

        tracing::debug!(
            user_id,
            word_id = session.word.id,
            stale,
            from = session.mode.as_str(),
            to = mode.as_str(),
            "discarding outstanding session"
        );
        None
    }

    /// Revising falls back to an unseen word in Learning mode; Learning has
    /// no fallback. The current session is only replaced when a word is
    /// actually issued.
    async fn issue(
        &self,
        user_id: UserId,
        state: &mut SessionState,
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<Option<IssuedWord>, StoreError> {
        let picked = match mode {
            SessionMode::Revising => match self.scheduler.pick_due_word(user_id, now).await? {
                Some(word) => Some((word, SessionMode::Revising)),
                None => self
                    .scheduler
                    .pick_unseen_word(user_id)
                    .await?
                    .map(|word| (word, SessionMode::Learning)),
            },
            SessionMode::Learning => self
                .scheduler
                .pick_unseen_word(user_id)
                .await?
                .map(|word| (word, SessionMode::Learning)),
        };

        let Some((word, entered)) = picked else {
            tracing::debug!(user_id, mode = mode.as_str(), "no word available");
            return Ok(None);
        };

        tracing::debug!(
            user_id,
            word_id = word.id,
            requested = mode.as_str(),
            entered = entered.as_str(),
            "issued word"
        );

        *state = SessionState::Active(ChatSession {
            word: word.clone(),
            mode: entered,
            issued_at: now,
            wrong_attempts: 0,
        });

        Ok(Some(IssuedWord {
            word,
            mode: entered,
            reused: false,
        }))
    }
}

fn answer_matches(submitted: &str, expected: &str) -> bool {
    submitted.trim().to_lowercase() == expected.trim().to_lowercase()
}
