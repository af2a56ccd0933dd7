//! The quiz progression state machine.
//!
//! `QuizSession` is synchronous and owns no timers: the caller decides when the
//! reveal pause is over and calls [`QuizSession::advance`] with the attempt number
//! it was handed by [`QuizSession::answer`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{Lesson, Question};

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where a quiz attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizPhase {
    Start,
    Questions,
    End,
}

/// Final classification of a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizOutcome {
    /// Every question answered correctly.
    Pass,
    /// Two or more questions missed.
    Fail,
    /// Exactly one question missed. Neither pass nor fail applies.
    Unclassified,
}

impl QuizOutcome {
    /// Classify a finished attempt with `correct` right answers out of `total`.
    #[must_use]
    pub fn classify(correct: usize, total: usize) -> Self {
        if correct == total {
            Self::Pass
        } else if correct < total.saturating_sub(1) {
            Self::Fail
        } else {
            Self::Unclassified
        }
    }
}

/// Reward predicate evaluated on the final tally: exactly `total - 1` correct.
// TODO: confirm with product whether a clean sweep (`correct == total`) should earn
// the reward instead; this grants points for exactly one miss.
#[must_use]
pub fn earns_reward(correct: usize, total: usize) -> bool {
    total.checked_sub(1) == Some(correct)
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Why an action was refused. Refusals never change session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizRejection {
    #[error("quiz can only begin from the start screen")]
    NotAtStart,

    #[error("answers are only accepted while questions are shown")]
    NotAnswering,

    #[error("an answer is already being revealed")]
    Revealing,

    #[error("choice {choice} is out of range for {len} choices")]
    ChoiceOutOfRange { choice: usize, len: usize },

    #[error("advance does not belong to the current attempt")]
    StaleAdvance,

    #[error("quiz has been closed")]
    Closed,
}

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// What happened when a choice was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    /// Attempt the pending advance must be tagged with.
    pub attempt: u64,
    pub question_index: usize,
    pub choice: usize,
    pub answer_index: usize,
    pub correct: bool,
    pub correct_count: usize,
}

/// Result of leaving the reveal pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion {
        question_index: usize,
    },
    Completed {
        outcome: QuizOutcome,
        correct_count: usize,
        /// Points to commit, present at most once per attempt.
        reward: Option<u32>,
    },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt over a lesson.
pub struct QuizSession {
    lesson: Arc<Lesson>,
    phase: QuizPhase,
    question_index: usize,
    correct_count: usize,
    revealing: bool,
    selected: Option<usize>,
    attempt: u64,
    reward_claimed: bool,
}

impl QuizSession {
    #[must_use]
    pub fn new(lesson: Arc<Lesson>) -> Self {
        Self {
            lesson,
            phase: QuizPhase::Start,
            question_index: 0,
            correct_count: 0,
            revealing: false,
            selected: None,
            attempt: 0,
            reward_claimed: false,
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Arc<Lesson> {
        &self.lesson
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn revealing(&self) -> bool {
        self.revealing
    }

    /// Choice submitted for the question being revealed.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.lesson.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::Questions => self.lesson.question(self.question_index),
            QuizPhase::Start | QuizPhase::End => None,
        }
    }

    /// Outcome of the attempt once it has ended.
    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        match self.phase {
            QuizPhase::End => Some(QuizOutcome::classify(
                self.correct_count,
                self.total_questions(),
            )),
            QuizPhase::Start | QuizPhase::Questions => None,
        }
    }

    /// Leave the start screen and show the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection::NotAtStart` outside `QuizPhase::Start`.
    pub fn begin(&mut self) -> Result<(), QuizRejection> {
        if self.phase != QuizPhase::Start {
            return Err(QuizRejection::NotAtStart);
        }
        self.clear();
        self.phase = QuizPhase::Questions;
        Ok(())
    }

    /// Submit a choice for the current question and enter the reveal pause.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection::NotAnswering` outside `QuizPhase::Questions`.
    /// Returns `QuizRejection::Revealing` while a previous answer is still shown.
    /// Returns `QuizRejection::ChoiceOutOfRange` if `choice` does not address a choice.
    pub fn answer(&mut self, choice: usize) -> Result<AnswerFeedback, QuizRejection> {
        if self.revealing {
            return Err(QuizRejection::Revealing);
        }
        let Some(question) = self.current_question() else {
            return Err(QuizRejection::NotAnswering);
        };
        let len = question.choices().len();
        if choice >= len {
            return Err(QuizRejection::ChoiceOutOfRange { choice, len });
        }
        let answer_index = question.answer_index();
        let correct = question.is_correct(choice);

        if correct {
            self.correct_count += 1;
        }
        self.revealing = true;
        self.selected = Some(choice);

        Ok(AnswerFeedback {
            attempt: self.attempt,
            question_index: self.question_index,
            choice,
            answer_index,
            correct,
            correct_count: self.correct_count,
        })
    }

    /// End the reveal pause started by `answer` in the given attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection::StaleAdvance` if the attempt has since been reset,
    /// or if no answer is being revealed.
    pub fn advance(&mut self, attempt: u64) -> Result<Advance, QuizRejection> {
        if attempt != self.attempt || !self.revealing || self.phase != QuizPhase::Questions {
            return Err(QuizRejection::StaleAdvance);
        }
        self.revealing = false;
        self.selected = None;

        let total = self.total_questions();
        if self.question_index + 1 < total {
            self.question_index += 1;
            return Ok(Advance::NextQuestion {
                question_index: self.question_index,
            });
        }

        self.phase = QuizPhase::End;
        let reward = if earns_reward(self.correct_count, total) && !self.reward_claimed {
            self.reward_claimed = true;
            Some(self.lesson.points())
        } else {
            None
        };

        Ok(Advance::Completed {
            outcome: QuizOutcome::classify(self.correct_count, total),
            correct_count: self.correct_count,
            reward,
        })
    }

    /// Return to the start screen, abandoning any pending reveal.
    pub fn reset(&mut self) {
        self.clear();
        self.phase = QuizPhase::Start;
    }

    fn clear(&mut self) {
        self.question_index = 0;
        self.correct_count = 0;
        self.revealing = false;
        self.selected = None;
        self.reward_claimed = false;
        self.attempt = self.attempt.wrapping_add(1);
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("lesson_id", &self.lesson.id())
            .field("phase", &self.phase)
            .field("question_index", &self.question_index)
            .field("correct_count", &self.correct_count)
            .field("revealing", &self.revealing)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
