pub mod interval;
pub mod scheduler;
pub mod session;
pub mod turn;

pub use interval::{FixedInterval, IntervalPolicy};
pub use scheduler::Scheduler;
pub use session::{
    Attempt, AttemptOutcome, ChatSession, IssuedWord, SessionManager, SessionNotFound,
    SessionState,
};
pub use turn::{Inbound, Keyboard, Reply, TurnHandler};
