use crate::domain::booking::{Booking, BookingDraft, BookingId, BookingKey, Transition};
use crate::domain::money::Fare;
use crate::domain::ports::{BookingStore, TrainStore, UserStore};
use crate::domain::train::{NewTrain, Train, TrainId};
use crate::domain::user::{Email, NewUser, ProfileUpdate, User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<UserId, User>,
    by_email: HashMap<Email, UserId>,
    last_id: u32,
}

/// A thread-safe in-memory store for users.
///
/// The email index lives under the same lock as the rows, so the uniqueness
/// check and the insert cannot interleave with another registration.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<UserTable>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<Option<User>> {
        let mut table = self.inner.write().await;
        if table.by_email.contains_key(&user.email) {
            return Ok(None);
        }
        table.last_id += 1;
        let user = user.with_id(UserId(table.last_id));
        table.by_email.insert(user.email.clone(), user.id);
        table.rows.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>> {
        let table = self.inner.read().await;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
        let mut table = self.inner.write().await;
        Ok(table.rows.get_mut(&id).map(|user| {
            user.apply_profile(update);
            user.clone()
        }))
    }
}

/// A thread-safe in-memory train catalogue.
#[derive(Default, Clone)]
pub struct InMemoryTrainStore {
    trains: Arc<RwLock<BTreeMap<TrainId, Train>>>,
}

impl InMemoryTrainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrainStore for InMemoryTrainStore {
    async fn insert(&self, train: NewTrain) -> Result<Train> {
        let mut trains = self.trains.write().await;
        let next = trains.keys().next_back().map_or(1, |id| id.0 + 1);
        let train = train.with_id(TrainId(next));
        trains.insert(train.id, train.clone());
        Ok(train)
    }

    async fn insert_all_if_empty(&self, new_trains: Vec<NewTrain>) -> Result<usize> {
        let mut trains = self.trains.write().await;
        if !trains.is_empty() {
            return Ok(0);
        }
        let count = new_trains.len();
        for (train, id) in new_trains.into_iter().zip(1..) {
            let train = train.with_id(TrainId(id));
            trains.insert(train.id, train);
        }
        Ok(count)
    }

    async fn get(&self, id: TrainId) -> Result<Option<Train>> {
        let trains = self.trains.read().await;
        Ok(trains.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Train>> {
        let trains = self.trains.read().await;
        let mut all: Vec<Train> = trains.values().cloned().collect();
        all.sort_by_key(|t| (t.departs, t.id));
        Ok(all)
    }

    async fn update_fare(&self, id: TrainId, fare: Fare) -> Result<Option<Train>> {
        let mut trains = self.trains.write().await;
        Ok(trains.get_mut(&id).map(|train| {
            train.base_fare = fare;
            train.clone()
        }))
    }
}

#[derive(Default)]
struct BookingTable {
    rows: BTreeMap<BookingId, Booking>,
    /// Unique index over live (non-cancelled) bookings.
    live: HashMap<BookingKey, BookingId>,
    last_id: u32,
}

/// A thread-safe in-memory store for bookings.
///
/// Each operation holds the write lock for its whole check-and-write, which
/// gives the same guarantees as a unique index plus a conditional update.
#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    inner: Arc<RwLock<BookingTable>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, draft: BookingDraft) -> Result<Option<Booking>> {
        let mut table = self.inner.write().await;
        let key = draft.key();
        if table.live.contains_key(&key) {
            return Ok(None);
        }
        table.last_id += 1;
        let booking = draft.with_id(BookingId(table.last_id));
        table.live.insert(key, booking.id);
        table.rows.insert(booking.id, booking.clone());
        Ok(Some(booking))
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let table = self.inner.read().await;
        let mut bookings: Vec<Booking> = table
            .rows
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn transition(
        &self,
        id: BookingId,
        owner: UserId,
        transition: Transition,
    ) -> Result<Option<Booking>> {
        let mut table = self.inner.write().await;
        let Some(booking) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if booking.user_id != owner || booking.apply(transition).is_err() {
            return Ok(None);
        }
        let updated = booking.clone();
        if updated.is_cancelled() {
            table.live.remove(&updated.key());
        }
        Ok(Some(updated))
    }
}
