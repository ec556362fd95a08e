//! User profile shown in the dashboard header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopwright_core::UserId;

use super::validation::{FieldError, optional_text, required_text};

/// Oldest accepted age.
pub const MAX_AGE: i16 = 120;

/// A stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Validated profile fields ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: String,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i16>,
    pub gender: Option<String>,
}

/// Raw profile form submission.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
}

impl ProfileForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] for a blank name or an age outside `0..=120`.
    pub fn validate(&self) -> Result<ProfileFields, FieldError> {
        let name = required_text("name", &self.name, "Name is required")?;

        let age = match optional_text(self.age.as_deref()) {
            Some(raw) => {
                let age = raw
                    .parse::<i16>()
                    .map_err(|_| FieldError::new("age", "Age must be a number"))?;
                if !(0..=MAX_AGE).contains(&age) {
                    return Err(FieldError::new("age", "Age must be between 0 and 120"));
                }
                Some(age)
            }
            None => None,
        };

        Ok(ProfileFields {
            name,
            photo_url: optional_text(self.photo_url.as_deref()),
            phone: optional_text(self.phone.as_deref()),
            age,
            gender: optional_text(self.gender.as_deref()),
        })
    }
}
