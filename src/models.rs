use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type WordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub translation: String,
    pub is_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWordProgress {
    pub user_id: UserId,
    pub word_id: WordId,
    pub level: u32,
    /// `None` means the word is fully learned and out of the revision pool.
    pub next_revise: Option<DateTime<Utc>>,
    pub is_custom: bool,
}

impl UserWordProgress {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_revise, Some(at) if at <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Learning,
    Revising,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Revising => "revising",
        }
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
