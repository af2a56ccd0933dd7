use std::sync::Arc;

use quiz_core::model::LessonId;

use crate::notify::{Notice, Notifier};
use crate::profile::ProfileStore;

/// What became of a reward commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardStatus {
    Granted { amount: u32, total: u64 },
    /// Nobody is signed in, so there is no profile to credit.
    SignedOut,
    Failed { reason: String },
}

/// Persists earned points and tells the user about it.
#[derive(Clone)]
pub struct RewardCommitter {
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
}

impl RewardCommitter {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { profiles, notifier }
    }

    /// Credit `amount` points to the signed-in user.
    ///
    /// On success the profile is refreshed and an info notice names the amount.
    /// On failure an error notice is raised; nothing is retried.
    pub async fn commit(&self, lesson_id: LessonId, amount: u32) -> RewardStatus {
        let Some(user_id) = self.profiles.current_user() else {
            tracing::info!(%lesson_id, amount, "reward skipped, no signed-in user");
            return RewardStatus::SignedOut;
        };

        let total = match self.profiles.grant_points(user_id, amount).await {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(%lesson_id, %user_id, amount, error = %err, "reward commit failed");
                self.notifier
                    .notify(Notice::error("We couldn't save your points. Please try again later."));
                return RewardStatus::Failed {
                    reason: err.to_string(),
                };
            }
        };
        tracing::info!(%lesson_id, %user_id, amount, total, "reward committed");

        if let Err(err) = self.profiles.refresh().await {
            tracing::warn!(%user_id, error = %err, "profile refresh after reward failed");
        }
        self.notifier
            .notify(Notice::info(format!("You have earned {amount} points!")));

        RewardStatus::Granted { amount, total }
    }
}
