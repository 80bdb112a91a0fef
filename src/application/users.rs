use crate::domain::ports::UserStoreBox;
use crate::domain::user::{Email, NewUser, ProfileUpdate, Registration, User, UserId};
use crate::error::{BookingError, FieldErrors, Result};
use validator::Validate;

/// Registration and profile maintenance.
pub struct UserService {
    users: UserStoreBox,
}

impl UserService {
    pub fn new(users: UserStoreBox) -> Self {
        Self { users }
    }

    /// Creates an account. Emails are unique regardless of case.
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let registration = Registration {
            name: registration.name.trim().to_string(),
            email: registration.email.trim().to_string(),
            password_hash: registration.password_hash,
        };
        registration.validate().map_err(FieldErrors::from)?;

        let user = NewUser {
            name: registration.name,
            email: Email::normalize(&registration.email),
            password_hash: registration.password_hash,
        };
        match self.users.insert(user).await? {
            Some(user) => {
                tracing::info!(user = %user.id, "user registered");
                Ok(user)
            }
            None => {
                tracing::warn!("registration rejected: email already registered");
                Err(BookingError::EmailTaken)
            }
        }
    }

    /// Changes the display name and, when given, the profile image reference.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User> {
        let update = ProfileUpdate {
            name: update.name.trim().to_string(),
            profile_image: update.profile_image,
        };
        update.validate().map_err(FieldErrors::from)?;

        self.users
            .update_profile(user_id, update)
            .await?
            .ok_or(BookingError::NotFound)
    }

    pub async fn get(&self, user_id: UserId) -> Result<User> {
        self.users.get(user_id).await?.ok_or(BookingError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(&Email::normalize(email)).await
    }
}
