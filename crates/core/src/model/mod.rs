mod answer;
mod candidate;
mod checkpoint;
mod ids;
mod paper;
mod question;
mod result;

pub use ids::{AttemptId, CandidateId, ParseIdError, QuestionId};

pub use answer::{Answer, AnswerStatus, option_label};
pub use candidate::{Candidate, CandidateError};
pub use checkpoint::{SessionCheckpoint, SessionPhase, SubmitReason, Submission};
pub use paper::{DEFAULT_DURATION_SECS, ExamPaper, PaperDraft, PaperError};
pub use question::{Marking, Marks, Question, QuestionDraft, QuestionError, QuestionKind};
pub use result::{ExamResult, Outcome, QuestionResult};
