//! Study Module
//!
//! Chat sessions, quizzes and curriculum editing over the study document.

pub mod curriculum;
pub mod prompt;
pub mod quiz;
pub mod session;

pub use curriculum::{resolve_difficulty, DIFFICULTY_LEVELS};
pub use prompt::{chat_prompt, quiz_prompt, CONTEXT_MESSAGES};
pub use quiz::{
    entropy, parse_questions, QuestionResult, Quiz, QuizPlan, QuizQuestion, QuizReport,
    MAX_QUESTIONS,
};
pub use session::{archive_active_session, summarize, MAX_ARCHIVED_SESSIONS};
