use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use quiz_core::model::{Profile, UserId};
use storage::repository::ProfileRepository;

use crate::Clock;
use crate::error::ProfileStoreError;

/// The signed-in user's profile, as far as quizzes are concerned.
///
/// Passed explicitly to the quiz layer instead of being read from ambient app state.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;

    /// Add `amount` points to `user_id`, returning the new balance.
    ///
    /// # Errors
    ///
    /// Returns `ProfileStoreError` if the points cannot be persisted.
    async fn grant_points(&self, user_id: UserId, amount: u32) -> Result<u64, ProfileStoreError>;

    /// Reload the signed-in user's profile from its source of truth.
    ///
    /// # Errors
    ///
    /// Returns `ProfileStoreError::SignedOut` without a user, or a storage error.
    async fn refresh(&self) -> Result<Option<Profile>, ProfileStoreError>;
}

/// `ProfileStore` backed by a `ProfileRepository`, caching the last refreshed profile.
pub struct ProfileSession {
    clock: Clock,
    user: Option<UserId>,
    profiles: Arc<dyn ProfileRepository>,
    cached: Mutex<Option<Profile>>,
}

impl ProfileSession {
    #[must_use]
    pub fn signed_in(clock: Clock, user: UserId, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            clock,
            user: Some(user),
            profiles,
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn signed_out(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            clock,
            user: None,
            profiles,
            cached: Mutex::new(None),
        }
    }

    /// Profile as of the last successful `refresh`.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProfileStore for ProfileSession {
    fn current_user(&self) -> Option<UserId> {
        self.user
    }

    async fn grant_points(&self, user_id: UserId, amount: u32) -> Result<u64, ProfileStoreError> {
        let total = self
            .profiles
            .add_points(user_id, amount, self.clock.now())
            .await?;
        Ok(total)
    }

    async fn refresh(&self) -> Result<Option<Profile>, ProfileStoreError> {
        let user = self.user.ok_or(ProfileStoreError::SignedOut)?;
        let profile = self.profiles.get_profile(user).await?;
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = profile.clone();
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn grant_then_refresh_updates_cached_profile() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(3);
        repo.upsert_profile(&Profile::new(user, "Lin", 5, fixed_now()).unwrap())
            .await
            .unwrap();

        let session = ProfileSession::signed_in(Clock::fixed(fixed_now()), user, Arc::new(repo));
        assert!(session.profile().is_none());

        assert_eq!(session.grant_points(user, 20).await.unwrap(), 25);
        let refreshed = session.refresh().await.unwrap().unwrap();
        assert_eq!(refreshed.points(), 25);
        assert_eq!(session.profile().unwrap().points(), 25);
    }

    #[tokio::test]
    async fn signed_out_session_cannot_refresh() {
        let session =
            ProfileSession::signed_out(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()));
        assert!(session.current_user().is_none());
        let err = session.refresh().await.unwrap_err();
        assert!(matches!(err, ProfileStoreError::SignedOut));
    }
}
