use super::booking::{Booking, BookingDraft, BookingId, Transition};
use super::money::Fare;
use super::train::{NewTrain, Train, TrainId};
use super::user::{Email, NewUser, ProfileUpdate, User, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for user accounts. Email uniqueness is enforced here.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new user, or returns `None` when the email is already taken.
    async fn insert(&self, user: NewUser) -> Result<Option<User>>;
    async fn get(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>>;
    /// Returns `None` when the user does not exist.
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>>;
}

/// Persistence for the train catalogue.
#[async_trait]
pub trait TrainStore: Send + Sync {
    async fn insert(&self, train: NewTrain) -> Result<Train>;
    /// Inserts all of `trains` when the catalogue is empty and returns how
    /// many were added. The emptiness check and the inserts are one unit of
    /// work, so concurrent seeders install the catalogue once.
    async fn insert_all_if_empty(&self, trains: Vec<NewTrain>) -> Result<usize>;
    async fn get(&self, id: TrainId) -> Result<Option<Train>>;
    /// All trains ordered by departure time.
    async fn list(&self) -> Result<Vec<Train>>;
    /// Administrative fare change. Existing bookings keep their own fare.
    async fn update_fare(&self, id: TrainId, fare: Fare) -> Result<Option<Train>>;
}

/// Persistence for bookings.
///
/// Every method is one unit of work: either all of its writes become visible
/// or none do.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts the draft unless a non-cancelled booking with the same
    /// (user, train, travel date) exists, in which case nothing is written
    /// and `None` is returned.
    async fn insert(&self, draft: BookingDraft) -> Result<Option<Booking>>;
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;
    /// The user's bookings, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;
    /// Compare-and-set: applies `transition` only if the booking exists,
    /// belongs to `owner` and is still `Created`. Returns the updated booking,
    /// or `None` when the condition did not hold.
    async fn transition(
        &self,
        id: BookingId,
        owner: UserId,
        transition: Transition,
    ) -> Result<Option<Booking>>;
}

pub type UserStoreBox = Box<dyn UserStore>;
pub type TrainStoreBox = Box<dyn TrainStore>;
pub type BookingStoreBox = Box<dyn BookingStore>;
