#![forbid(unsafe_code)]

pub mod model;
pub mod quiz;
pub mod time;

pub use quiz::{
    Advance, AnswerFeedback, QuizOutcome, QuizPhase, QuizRejection, QuizSession, earns_reward,
};
pub use time::Clock;
