#![forbid(unsafe_code)]

pub mod error;
pub mod lesson_service;
pub mod notify;
pub mod profile;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::{LessonServiceError, ProfileStoreError, QuizServiceError};
pub use lesson_service::LessonService;
pub use notify::{LogNotifier, Notice, Notifier, Severity};
pub use profile::{ProfileSession, ProfileStore};

pub use quiz::{
    ChoiceState, ChoiceView, LessonLoad, QuizEngine, QuizService, QuizSnapshot, QuizView,
    RewardCommitter, RewardStatus,
};
