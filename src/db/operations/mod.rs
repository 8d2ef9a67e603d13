pub mod progress;
pub mod words;

pub use progress::*;
pub use words::*;
