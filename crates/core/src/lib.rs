#![forbid(unsafe_code)]

pub mod attempt;
pub mod flatten;
pub mod model;
pub mod reconcile;
pub mod sampler;
pub mod time;

pub use attempt::{AttemptError, AttemptPhase, ExamAttempt};
pub use flatten::{FlattenedItem, flatten_pool};
pub use model::{
    AnswerRecord, AttemptBlueprint, BlueprintError, ChoiceError, ChoiceLetter, ChoiceTexts,
    ClassificationId, ExamContext, ExamId, ExamResultBlock, ParseIdError, PoolQuestion,
    QuestionContent, QuestionError, QuestionId, SessionResult, Subpart, UserId, Verdict,
};
pub use reconcile::{
    ClassificationTally, GradeReport, ItemOutcome, PointValues, reconcile,
};
pub use sampler::{SampleOutcome, SampleUnit, StratumKey, build_strata, sample};
pub use time::Clock;
