mod driver;
mod progress;
mod service;

// Public API of the session subsystem.
pub use driver::{SessionDriver, SessionHandle};
pub use progress::SessionProgress;
pub use service::ExamSessionService;
