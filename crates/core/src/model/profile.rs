use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("display name cannot be empty")]
    EmptyDisplayName,
}

/// A user's profile as seen by the quiz: who they are and how many points they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    user_id: UserId,
    display_name: String,
    points: u64,
    updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a validated profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyDisplayName` if the display name is blank.
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        points: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        let display_name = display_name.into();
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ProfileError::EmptyDisplayName);
        }
        Ok(Self {
            user_id,
            display_name: display_name.to_owned(),
            points,
            updated_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn points(&self) -> u64 {
        self.points
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn profile_trims_display_name() {
        let profile = Profile::new(UserId::new(1), "  Ada ", 10, fixed_now()).unwrap();
        assert_eq!(profile.display_name(), "Ada");
        assert_eq!(profile.points(), 10);
    }

    #[test]
    fn profile_rejects_blank_name() {
        let err = Profile::new(UserId::new(1), " ", 0, fixed_now()).unwrap_err();
        assert_eq!(err, ProfileError::EmptyDisplayName);
    }
}
