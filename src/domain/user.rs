use super::validation::{dotted_domain, image_file_name, letters_and_spaces};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An email address in canonical (trimmed, lower-case) form.
///
/// Two addresses that differ only in case compare equal, which is what the
/// uniqueness index relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration input. The password arrives already hashed.
#[derive(Debug, Clone, Validate)]
pub struct Registration {
    #[validate(
        length(min = 2, max = 120, message = "Name must be between 2 and 120 characters"),
        custom(function = "letters_and_spaces")
    )]
    pub name: String,
    #[validate(
        email(message = "Please enter a valid email address"),
        custom(function = "dotted_domain"),
        length(max = 120, message = "Email must be less than 120 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password credential is required"))]
    pub password_hash: String,
}

/// The mutable part of a user.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProfileUpdate {
    #[validate(
        length(min = 2, max = 120, message = "Name must be between 2 and 120 characters"),
        custom(function = "letters_and_spaces")
    )]
    pub name: String,
    #[validate(custom(function = "image_file_name"))]
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

impl NewUser {
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            profile_image: None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub profile_image: Option<String>,
}

impl User {
    pub fn apply_profile(&mut self, update: ProfileUpdate) {
        self.name = update.name;
        if update.profile_image.is_some() {
            self.profile_image = update.profile_image;
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("profile_image", &self.profile_image)
            .finish()
    }
}
