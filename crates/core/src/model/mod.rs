mod answer;
mod blueprint;
mod choice;
mod ids;
mod question;
mod result;

pub use answer::{AnswerRecord, Verdict};
pub use blueprint::{AttemptBlueprint, BlueprintError, ExamContext};
pub use choice::{ChoiceError, ChoiceLetter, ChoiceTexts};
pub use ids::{ClassificationId, ExamId, ParseIdError, QuestionId, UserId};
pub use question::{PoolQuestion, QuestionContent, QuestionError, Subpart};
pub use result::{ExamResultBlock, SessionResult};
