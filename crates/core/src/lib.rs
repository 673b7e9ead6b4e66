pub mod countdown;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod ledger;
pub mod model;
pub mod report;
pub mod responses;
pub mod session;
pub mod time;

pub use error::Error;
pub use session::{ExamSession, SessionCommand, SessionError};
pub use time::Clock;
