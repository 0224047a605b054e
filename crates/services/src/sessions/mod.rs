mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::AttemptProgress;
pub use service::SessionService;
pub use workflow::{FinishOutcome, SessionWorkflow};
