use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{SessionMode, UserId};
use crate::services::session::{AttemptOutcome, IssuedWord, SessionManager, MAX_ATTEMPTS};
use crate::store::StoreError;

pub const LABEL_REMEMBERED: &str = "Remembered";
pub const LABEL_SHOW_AGAIN: &str = "Show again";
pub const LABEL_ALREADY_KNEW: &str = "Already knew";
pub const LABEL_START_LEARNING: &str = "Start learning";
pub const LABEL_MENU_REVISE: &str = "Revise words";
pub const LABEL_MENU_LEARN: &str = "Learn new words";

const MENU_TEXT: &str = "Send /start or /menu to open this menu.\n\
Send /revise or press the button below to revise words.\n\
Send /learn or press the button below to learn new words.\n\n\
Cards come back for revision on a spaced-repetition schedule: \
confirm a card once you have learned it.";
const NO_REVISE_PREFIX: &str = "No words to revise. Here is a new word:";
const NO_NEW_WORDS_TEXT: &str = "No new words left to learn.";
const NOTHING_TO_SHOW_TEXT: &str = "Nothing to show right now. Come back later.";
const FAILURE_TEXT: &str = "Something went wrong, please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Command { name: String },
    Button { data: String },
    Text { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    None,
    /// Inline buttons with `revise` / `learn` callback data.
    Menu,
    Review,
    Learn,
}

impl Keyboard {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Menu => &[LABEL_MENU_REVISE, LABEL_MENU_LEARN],
            Self::Review => &[LABEL_REMEMBERED, LABEL_SHOW_AGAIN],
            Self::Learn => &[LABEL_ALREADY_KNEW, LABEL_START_LEARNING],
        }
    }

    fn for_mode(mode: SessionMode) -> Self {
        match mode {
            SessionMode::Learning => Self::Learn,
            SessionMode::Revising => Self::Review,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub chat_id: UserId,
    pub text: String,
    pub keyboard: Keyboard,
    pub buttons: Vec<String>,
}

impl Reply {
    fn new(chat_id: UserId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard,
            buttons: keyboard.labels().iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardAction {
    Remembered,
    ShowAgain,
    AlreadyKnew,
    StartLearning,
}

impl CardAction {
    fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        [
            (LABEL_REMEMBERED, Self::Remembered),
            (LABEL_SHOW_AGAIN, Self::ShowAgain),
            (LABEL_ALREADY_KNEW, Self::AlreadyKnew),
            (LABEL_START_LEARNING, Self::StartLearning),
        ]
        .into_iter()
        .find(|(label, _)| label.to_lowercase() == normalized)
        .map(|(_, action)| action)
    }
}

/// Maps chat events onto session operations and renders the reply. Knows
/// nothing about the messaging transport.
pub struct TurnHandler {
    sessions: Arc<SessionManager>,
}

impl TurnHandler {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    pub async fn handle(&self, chat_id: UserId, inbound: Inbound) -> Reply {
        let result = match inbound {
            Inbound::Command { name } => self.on_command(chat_id, &name).await,
            Inbound::Button { data } => self.on_command(chat_id, &data).await,
            Inbound::Text { text } => self.on_text(chat_id, &text).await,
        };

        result.unwrap_or_else(|err| {
            tracing::warn!(chat_id, error = %err, "turn failed");
            Reply::new(chat_id, FAILURE_TEXT, Keyboard::None)
        })
    }

    async fn on_command(&self, chat_id: UserId, name: &str) -> Result<Reply, StoreError> {
        match name.trim().trim_start_matches('/').to_lowercase().as_str() {
            "revise" => self.show(chat_id, SessionMode::Revising).await,
            "learn" => self.show(chat_id, SessionMode::Learning).await,
            _ => Ok(menu(chat_id)),
        }
    }

    async fn on_text(&self, chat_id: UserId, text: &str) -> Result<Reply, StoreError> {
        if let Some(action) = CardAction::parse(text) {
            return self.on_card_action(chat_id, action).await;
        }

        let attempt = match self.sessions.record_attempt(chat_id, text).await {
            Ok(attempt) => attempt,
            Err(_) => return Ok(menu(chat_id)),
        };

        let session = attempt.session;
        let reply = match attempt.outcome {
            AttemptOutcome::IncorrectRetry { .. } => Reply::new(
                chat_id,
                format!(
                    "{}\nWrong, attempts: {}/{}",
                    session.word.translation, session.wrong_attempts, MAX_ATTEMPTS
                ),
                Keyboard::None,
            ),
            AttemptOutcome::Correct | AttemptOutcome::IncorrectExhausted => Reply::new(
                chat_id,
                format!("{}\n{}", session.word.text, session.word.translation),
                Keyboard::for_mode(session.mode),
            ),
        };
        Ok(reply)
    }

    async fn on_card_action(
        &self,
        chat_id: UserId,
        action: CardAction,
    ) -> Result<Reply, StoreError> {
        let now = Utc::now();
        match action {
            CardAction::Remembered => {
                self.sessions.resolve_and_commit(chat_id, false, now).await?;
                self.show(chat_id, SessionMode::Revising).await
            }
            CardAction::AlreadyKnew => {
                self.sessions.resolve_and_commit(chat_id, true, now).await?;
                self.show(chat_id, SessionMode::Learning).await
            }
            CardAction::StartLearning => {
                self.sessions.resolve_and_commit(chat_id, false, now).await?;
                self.show(chat_id, SessionMode::Learning).await
            }
            CardAction::ShowAgain => {
                self.sessions.resolve(chat_id).await;
                self.show(chat_id, SessionMode::Revising).await
            }
        }
    }

    async fn show(&self, chat_id: UserId, mode: SessionMode) -> Result<Reply, StoreError> {
        let issued = self
            .sessions
            .get_active_or_reissue(chat_id, mode, Utc::now())
            .await?;

        Ok(match issued {
            Some(issued) => render_issued(chat_id, mode, &issued),
            None if mode == SessionMode::Learning => {
                Reply::new(chat_id, NO_NEW_WORDS_TEXT, Keyboard::None)
            }
            None => Reply::new(chat_id, NOTHING_TO_SHOW_TEXT, Keyboard::None),
        })
    }
}

fn render_issued(chat_id: UserId, requested: SessionMode, issued: &IssuedWord) -> Reply {
    let keyboard = Keyboard::for_mode(issued.mode);
    if requested == SessionMode::Revising && issued.mode == SessionMode::Learning {
        return Reply::new(
            chat_id,
            format!("{NO_REVISE_PREFIX}\n{}", issued.word.translation),
            keyboard,
        );
    }
    Reply::new(chat_id, issued.word.translation.clone(), keyboard)
}

fn menu(chat_id: UserId) -> Reply {
    Reply::new(chat_id, MENU_TEXT, Keyboard::Menu)
}
