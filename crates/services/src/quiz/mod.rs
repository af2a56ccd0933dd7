mod engine;
mod reward;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use engine::{QuizEngine, QuizSnapshot};
pub use reward::{RewardCommitter, RewardStatus};
pub use view::{ChoiceState, ChoiceView, QuizView};
pub use workflow::{LessonLoad, QuizService};
