use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use quiz_core::model::{Lesson, QuizSettings};
use quiz_core::{Advance, AnswerFeedback, QuizOutcome, QuizPhase, QuizRejection, QuizSession};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::reward::{RewardCommitter, RewardStatus};
use super::view::QuizView;

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Read-only copy of the engine state for a view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSnapshot {
    pub lesson: Arc<Lesson>,
    pub phase: QuizPhase,
    pub question_index: usize,
    pub correct_count: usize,
    pub revealing: bool,
    pub selected: Option<usize>,
    pub outcome: Option<QuizOutcome>,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Handle to the one pending reveal pause.
struct RevealTimer {
    attempt: u64,
    handle: JoinHandle<()>,
}

impl RevealTimer {
    fn cancel(self) {
        self.handle.abort();
    }
}

struct EngineState {
    session: QuizSession,
    reveal: Option<RevealTimer>,
    reward: Option<JoinHandle<RewardStatus>>,
    closed: bool,
}

struct Shared {
    state: Mutex<EngineState>,
    rewards: RewardCommitter,
    reveal_delay: Duration,
    /// Woken whenever a reveal ends, is cancelled, or the engine closes.
    reveal_done: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs on the timer task once the reveal pause for `attempt` has elapsed.
    fn finish_reveal(&self, attempt: u64) {
        let mut state = self.lock();
        if state.reveal.as_ref().is_some_and(|t| t.attempt == attempt) {
            state.reveal = None;
        }
        if state.closed {
            return;
        }
        self.advance(&mut state, attempt);
        self.reveal_done.notify_waiters();
    }

    fn advance(&self, state: &mut EngineState, attempt: u64) {
        let lesson_id = state.session.lesson().id();
        match state.session.advance(attempt) {
            Ok(Advance::NextQuestion { question_index }) => {
                tracing::debug!(%lesson_id, question_index, "next question");
            }
            Ok(Advance::Completed {
                outcome,
                correct_count,
                reward,
            }) => {
                tracing::info!(
                    %lesson_id,
                    ?outcome,
                    correct_count,
                    total = state.session.total_questions(),
                    rewarded = reward.is_some(),
                    "quiz completed"
                );
                if let Some(amount) = reward {
                    let rewards = self.rewards.clone();
                    state.reward = Some(tokio::spawn(async move {
                        rewards.commit(lesson_id, amount).await
                    }));
                }
            }
            Err(rejection) => {
                tracing::debug!(%lesson_id, attempt, %rejection, "ignoring stale reveal timer");
            }
        }
    }
}

/// Drives one quiz attempt at a time over a loaded lesson.
///
/// Actions run to completion under a lock. `answer` starts a reveal pause on a
/// Tokio timer; when it elapses the session advances, and a rewarded completion
/// commits points on a separate task so the end screen is never blocked on it.
///
/// All action methods must be called from within a Tokio runtime.
pub struct QuizEngine {
    shared: Arc<Shared>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(lesson: Arc<Lesson>, settings: QuizSettings, rewards: RewardCommitter) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    session: QuizSession::new(lesson),
                    reveal: None,
                    reward: None,
                    closed: false,
                }),
                rewards,
                reveal_delay: settings.reveal_delay(),
                reveal_done: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn lesson(&self) -> Arc<Lesson> {
        Arc::clone(self.shared.lock().session.lesson())
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        let state = self.shared.lock();
        let session = &state.session;
        QuizSnapshot {
            lesson: Arc::clone(session.lesson()),
            phase: session.phase(),
            question_index: session.question_index(),
            correct_count: session.correct_count(),
            revealing: session.revealing(),
            selected: session.selected(),
            outcome: session.outcome(),
        }
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        QuizView::from_session(&self.shared.lock().session)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Start answering from the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection::Closed` after `exit`, or `QuizRejection::NotAtStart`.
    pub fn begin(&self) -> Result<(), QuizRejection> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(QuizRejection::Closed);
        }
        state.session.begin()?;
        tracing::debug!(lesson_id = %state.session.lesson().id(), "quiz started");
        Ok(())
    }

    /// Submit a choice for the current question.
    ///
    /// Refused submissions leave the state untouched. An accepted one starts the
    /// reveal pause; no further answer is accepted until it elapses.
    ///
    /// # Errors
    ///
    /// Returns the `QuizRejection` explaining why the answer was ignored.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn answer(&self, choice: usize) -> Result<AnswerFeedback, QuizRejection> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(QuizRejection::Closed);
        }
        let feedback = match state.session.answer(choice) {
            Ok(feedback) => feedback,
            Err(rejection) => {
                tracing::debug!(choice, %rejection, "answer ignored");
                return Err(rejection);
            }
        };
        tracing::debug!(
            question_index = feedback.question_index,
            choice,
            correct = feedback.correct,
            "answer accepted"
        );

        let shared = Arc::clone(&self.shared);
        let delay = self.shared.reveal_delay;
        let attempt = feedback.attempt;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.finish_reveal(attempt);
        });
        if let Some(previous) = state.reveal.replace(RevealTimer { attempt, handle }) {
            previous.cancel();
        }

        Ok(feedback)
    }

    /// Return to the start screen, cancelling any pending reveal.
    ///
    /// A reward already being committed for a finished attempt is left to complete.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection::Closed` after `exit`.
    pub fn reset(&self) -> Result<(), QuizRejection> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(QuizRejection::Closed);
        }
        if let Some(timer) = state.reveal.take() {
            timer.cancel();
        }
        state.session.reset();
        self.shared.reveal_done.notify_waiters();
        tracing::debug!(lesson_id = %state.session.lesson().id(), "quiz reset");
        Ok(())
    }

    /// Leave the quiz. Cancels any pending reveal; later actions are refused.
    pub fn exit(&self) {
        let mut state = self.shared.lock();
        if let Some(timer) = state.reveal.take() {
            timer.cancel();
        }
        if !state.closed {
            state.closed = true;
            tracing::debug!(lesson_id = %state.session.lesson().id(), "quiz closed");
        }
        self.shared.reveal_done.notify_waiters();
    }

    /// Wait until no reveal pause is pending: it elapsed and was applied, or it was
    /// cancelled by `reset` or `exit`.
    ///
    /// Cancel safe: dropping the future leaves the pending reveal untouched.
    pub async fn wait_reveal(&self) {
        loop {
            let notified = self.shared.reveal_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.shared.lock();
                if state.closed || !state.session.revealing() {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Wait for the pending reveal and any reward commit it started.
    ///
    /// Returns the reward status if a commit was started since the last call.
    pub async fn settle(&self) -> Option<RewardStatus> {
        self.wait_reveal().await;
        let reward = self.shared.lock().reward.take();
        match reward {
            Some(handle) => handle.await.ok(),
            None => None,
        }
    }
}

impl Drop for QuizEngine {
    fn drop(&mut self) {
        self.exit();
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("QuizEngine")
            .field("session", &state.session)
            .field("reveal_pending", &state.reveal.is_some())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}
