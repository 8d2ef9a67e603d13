use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::DatabaseProxy;
use crate::services::{FixedInterval, Scheduler, SessionManager, TurnHandler};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Arc<DatabaseProxy>,
    sessions: Arc<SessionManager>,
    turns: Arc<TurnHandler>,
}

impl AppState {
    pub fn new(
        db_proxy: Arc<DatabaseProxy>,
        revise_interval: chrono::Duration,
        session_stale_after: chrono::Duration,
    ) -> Self {
        let scheduler = Scheduler::with_policy(
            db_proxy.clone(),
            Arc::new(FixedInterval::new(revise_interval)),
        );
        let sessions = Arc::new(SessionManager::with_stale_after(
            scheduler,
            session_stale_after,
        ));
        let turns = Arc::new(TurnHandler::new(Arc::clone(&sessions)));

        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            sessions,
            turns,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Arc<DatabaseProxy> {
        Arc::clone(&self.db_proxy)
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn turns(&self) -> Arc<TurnHandler> {
        Arc::clone(&self.turns)
    }
}
