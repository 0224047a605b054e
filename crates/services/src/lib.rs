#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod grading;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use bank::{InMemoryQuestionBank, PoolFilter, QuestionBank};
pub use error::{BankError, GradingError, SessionError};
pub use grading::{
    GradingAnswer, GradingConfig, GradingRequest, GradingService, HttpGradingClient,
};

pub use sessions::{
    AttemptProgress, FinishOutcome, SessionBuilder, SessionPlan, SessionService, SessionWorkflow,
};
