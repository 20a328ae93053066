mod ids;
mod question;
mod session;

pub use ids::{ParseIdError, QuestionId};
pub use question::QuestionRecord;
pub use session::{QuizState, QuizStateError, QuizStats};
