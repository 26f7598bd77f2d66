pub mod history;
pub mod quiz;
pub mod result;

pub use history::{HighScore, PlayerHistory, StarReport};
pub use quiz::{Problem, QuestionOutcome, QuizSession, SessionState, SessionSummary, TimeoutEvent};
pub use result::QuizResult;
