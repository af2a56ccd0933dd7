mod ids;
mod lesson;
mod profile;
mod settings;

pub use ids::{LessonId, ParseIdError, UserId};
pub use lesson::{Lesson, LessonDraft, LessonError, Question, QuestionDraft};
pub use profile::{Profile, ProfileError};
pub use settings::{QuizSettings, QuizSettingsError};
