use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("reveal delay must be at most {max_ms} ms, got {got_ms} ms")]
    RevealDelayTooLong { got_ms: u64, max_ms: u64 },
}

/// Tunables for quiz pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    reveal_delay: Duration,
}

impl QuizSettings {
    pub const DEFAULT_REVEAL_DELAY_MS: u64 = 1_000;
    pub const MAX_REVEAL_DELAY_MS: u64 = 60_000;

    /// Creates settings with the given reveal pause, in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError::RevealDelayTooLong` above `MAX_REVEAL_DELAY_MS`.
    pub fn new(reveal_delay_ms: u64) -> Result<Self, QuizSettingsError> {
        if reveal_delay_ms > Self::MAX_REVEAL_DELAY_MS {
            return Err(QuizSettingsError::RevealDelayTooLong {
                got_ms: reveal_delay_ms,
                max_ms: Self::MAX_REVEAL_DELAY_MS,
            });
        }
        Ok(Self {
            reveal_delay: Duration::from_millis(reveal_delay_ms),
        })
    }

    /// How long answer correctness stays on screen before the quiz moves on.
    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(Self::DEFAULT_REVEAL_DELAY_MS),
        }
    }
}
