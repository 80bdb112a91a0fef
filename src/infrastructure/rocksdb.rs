use crate::domain::booking::{Booking, BookingDraft, BookingId, BookingKey, Transition};
use crate::domain::money::Fare;
use crate::domain::ports::{BookingStore, TrainStore, UserStore};
use crate::domain::train::{NewTrain, Train, TrainId};
use crate::domain::user::{Email, NewUser, ProfileUpdate, User, UserId};
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::Datelike;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for user rows, keyed by user id.
pub const CF_USERS: &str = "users";
/// Column Family mapping canonical email to user id (the uniqueness index).
pub const CF_USER_EMAILS: &str = "user_emails";
/// Column Family for the train catalogue.
pub const CF_TRAINS: &str = "trains";
/// Column Family for booking rows, keyed by booking id.
pub const CF_BOOKINGS: &str = "bookings";
/// Column Family mapping (user, train, travel date) to the live booking id.
pub const CF_BOOKING_KEYS: &str = "booking_keys";
/// Column Family holding the surrogate id counters.
pub const CF_SEQUENCES: &str = "sequences";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_USERS,
    CF_USER_EMAILS,
    CF_TRAINS,
    CF_BOOKINGS,
    CF_BOOKING_KEYS,
    CF_SEQUENCES,
];

/// How long a transaction waits for a row lock held by another one.
const LOCK_TIMEOUT_MS: i64 = 5_000;

type Txn<'a> = Transaction<'a, TransactionDB>;

/// A persistent store implementation using a RocksDB `TransactionDB`.
///
/// Every write path runs in a pessimistic transaction: rows and index entries
/// are read with `get_for_update`, which locks them until commit. Concurrent
/// writers to the same booking therefore serialise, and the second one sees
/// the first one's result. Dropping an uncommitted transaction rolls it back.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<TransactionDB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<TransactionDB>,
}

impl RocksDBStore {
    /// Opens or creates a database at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(LOCK_TIMEOUT_MS);

        let cfs = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));

        let db = TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cfs)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BookingError::storage(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn read_for_update<T: DeserializeOwned>(
        &self,
        txn: &Txn<'_>,
        cf: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match txn.get_for_update_cf(cf, key, true)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, txn: &Txn<'_>, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        txn.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    /// Bumps the named counter inside `txn` and returns the new value.
    fn next_id(&self, txn: &Txn<'_>, sequence: &str) -> Result<u32> {
        let cf = self.cf(CF_SEQUENCES)?;
        let current = match txn.get_for_update_cf(cf, sequence, true)? {
            Some(bytes) => decode_u32(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        txn.put_cf(cf, sequence, next.to_be_bytes())?;
        Ok(next)
    }

    fn insert_user(&self, user: NewUser) -> Result<Option<User>> {
        let txn = self.db.transaction();
        let emails = self.cf(CF_USER_EMAILS)?;
        if txn
            .get_for_update_cf(emails, user.email.as_str(), true)?
            .is_some()
        {
            return Ok(None);
        }

        let user = user.with_id(UserId(self.next_id(&txn, CF_USERS)?));
        let id = user.id.0.to_be_bytes();
        self.write(&txn, CF_USERS, &id, &user)?;
        txn.put_cf(emails, user.email.as_str(), id)?;
        txn.commit()?;
        Ok(Some(user))
    }

    fn update_user(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
        let txn = self.db.transaction();
        let key = id.0.to_be_bytes();
        let Some(mut user) = self.read_for_update::<User>(&txn, CF_USERS, &key)? else {
            return Ok(None);
        };
        user.apply_profile(update);
        self.write(&txn, CF_USERS, &key, &user)?;
        txn.commit()?;
        Ok(Some(user))
    }

    fn insert_train(&self, train: NewTrain) -> Result<Train> {
        let txn = self.db.transaction();
        let train = train.with_id(TrainId(self.next_id(&txn, CF_TRAINS)?));
        self.write(&txn, CF_TRAINS, &train.id.0.to_be_bytes(), &train)?;
        txn.commit()?;
        Ok(train)
    }

    /// The train sequence doubles as the "catalogue seeded" marker: it is
    /// locked for the whole transaction, so a second seeder waits and then
    /// finds it set.
    fn seed_trains(&self, trains: Vec<NewTrain>) -> Result<usize> {
        let txn = self.db.transaction();
        let sequences = self.cf(CF_SEQUENCES)?;
        if txn.get_for_update_cf(sequences, CF_TRAINS, true)?.is_some() {
            return Ok(0);
        }

        let count = trains.len();
        for train in trains {
            let train = train.with_id(TrainId(self.next_id(&txn, CF_TRAINS)?));
            self.write(&txn, CF_TRAINS, &train.id.0.to_be_bytes(), &train)?;
        }
        txn.commit()?;
        Ok(count)
    }

    fn set_fare(&self, id: TrainId, fare: Fare) -> Result<Option<Train>> {
        let txn = self.db.transaction();
        let key = id.0.to_be_bytes();
        let Some(mut train) = self.read_for_update::<Train>(&txn, CF_TRAINS, &key)? else {
            return Ok(None);
        };
        train.base_fare = fare;
        self.write(&txn, CF_TRAINS, &key, &train)?;
        txn.commit()?;
        Ok(Some(train))
    }

    fn insert_booking(&self, draft: BookingDraft) -> Result<Option<Booking>> {
        let txn = self.db.transaction();
        let index = self.cf(CF_BOOKING_KEYS)?;
        let unique = encode_booking_key(&draft.key());
        if txn.get_for_update_cf(index, unique, true)?.is_some() {
            return Ok(None);
        }

        let booking = draft.with_id(BookingId(self.next_id(&txn, CF_BOOKINGS)?));
        let id = booking.id.0.to_be_bytes();
        self.write(&txn, CF_BOOKINGS, &id, &booking)?;
        txn.put_cf(index, unique, id)?;
        txn.commit()?;
        Ok(Some(booking))
    }

    fn transition_booking(
        &self,
        id: BookingId,
        owner: UserId,
        transition: Transition,
    ) -> Result<Option<Booking>> {
        let txn = self.db.transaction();
        let key = id.0.to_be_bytes();
        let Some(mut booking) = self.read_for_update::<Booking>(&txn, CF_BOOKINGS, &key)? else {
            return Ok(None);
        };
        if booking.user_id != owner || booking.apply(transition).is_err() {
            return Ok(None);
        }

        self.write(&txn, CF_BOOKINGS, &key, &booking)?;
        if booking.is_cancelled() {
            let index = self.cf(CF_BOOKING_KEYS)?;
            txn.delete_cf(index, encode_booking_key(&booking.key()))?;
        }
        txn.commit()?;
        Ok(Some(booking))
    }
}

fn decode_u32(bytes: &[u8]) -> Result<u32> {
    <[u8; 4]>::try_from(bytes)
        .map(u32::from_be_bytes)
        .map_err(|_| BookingError::storage("corrupt sequence value"))
}

/// `user | train | days since CE`, all big-endian.
fn encode_booking_key(key: &BookingKey) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[..4].copy_from_slice(&key.user_id.0.to_be_bytes());
    out[4..8].copy_from_slice(&key.train_id.0.to_be_bytes());
    out[8..].copy_from_slice(&key.travel_date.num_days_from_ce().to_be_bytes());
    out
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn insert(&self, user: NewUser) -> Result<Option<User>> {
        self.insert_user(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        self.read(CF_USERS, &id.0.to_be_bytes())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>> {
        let cf = self.cf(CF_USER_EMAILS)?;
        match self.db.get_cf(cf, email.as_str())? {
            Some(id) => self.read(CF_USERS, &id),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
        self.update_user(id, update)
    }
}

#[async_trait]
impl TrainStore for RocksDBStore {
    async fn insert(&self, train: NewTrain) -> Result<Train> {
        self.insert_train(train)
    }

    async fn insert_all_if_empty(&self, trains: Vec<NewTrain>) -> Result<usize> {
        self.seed_trains(trains)
    }

    async fn get(&self, id: TrainId) -> Result<Option<Train>> {
        self.read(CF_TRAINS, &id.0.to_be_bytes())
    }

    async fn list(&self) -> Result<Vec<Train>> {
        let mut trains: Vec<Train> = self.scan(CF_TRAINS)?;
        trains.sort_by_key(|t| (t.departs, t.id));
        Ok(trains)
    }

    async fn update_fare(&self, id: TrainId, fare: Fare) -> Result<Option<Train>> {
        self.set_fare(id, fare)
    }
}

#[async_trait]
impl BookingStore for RocksDBStore {
    async fn insert(&self, draft: BookingDraft) -> Result<Option<Booking>> {
        self.insert_booking(draft)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        self.read(CF_BOOKINGS, &id.0.to_be_bytes())
    }

    // TODO: add a per-user secondary index once booking volumes make the full scan noticeable.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .scan::<Booking>(CF_BOOKINGS)?
            .into_iter()
            .filter(|b| b.user_id == user_id)
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
        self.transition_booking(id, owner, transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{Gender, Passenger, SeatClass};
    use crate::domain::train::default_trains;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn draft() -> BookingDraft {
        BookingDraft {
            user_id: UserId(1),
            train_id: TrainId(1),
            passenger: Passenger {
                name: "Ada".to_string(),
                age: 30,
                gender: Gender::Female,
            },
            travel_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            seat_class: SeatClass::Economy,
            fare: Fare::new(dec!(450)).unwrap(),
            booked_at: Utc.with_ymd_and_hms(2029, 12, 1, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some(), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_rocksdb_user_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let new_user = NewUser {
            name: "Ada".to_string(),
            email: Email::normalize("ada@example.com"),
            password_hash: "hash".to_string(),
        };

        let user = UserStore::insert(&store, new_user.clone())
            .await
            .unwrap()
            .unwrap();
        assert!(UserStore::insert(&store, new_user).await.unwrap().is_none());

        let found = store
            .find_by_email(&Email::normalize("Ada@Example.com"))
            .await
            .unwrap();
        assert_eq!(found, Some(user.clone()));
        assert_eq!(UserStore::get(&store, user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_rocksdb_train_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        for train in default_trains().unwrap().into_iter().rev() {
            TrainStore::insert(&store, train).await.unwrap();
        }

        let trains = store.list().await.unwrap();
        assert_eq!(trains.len(), 3);
        assert_eq!(trains[0].name, "Blue Express");

        let updated = store
            .update_fare(trains[0].id, Fare::new(dec!(999)).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.base_fare.value(), dec!(999));
    }

    #[tokio::test]
    async fn test_rocksdb_booking_lifecycle() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let booking = BookingStore::insert(&store, draft()).await.unwrap().unwrap();
        assert!(BookingStore::insert(&store, draft()).await.unwrap().is_none());

        let now = Utc.with_ymd_and_hms(2029, 12, 2, 8, 0, 0).unwrap();
        assert!(
            store
                .transition(booking.id, UserId(2), Transition::pay(now))
                .await
                .unwrap()
                .is_none()
        );
        let paid = store
            .transition(booking.id, UserId(1), Transition::pay(now))
            .await
            .unwrap()
            .unwrap();
        assert!(paid.is_paid());
        assert!(
            store
                .transition(booking.id, UserId(1), Transition::pay(now))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            BookingStore::get(&store, booking.id).await.unwrap(),
            Some(paid)
        );
    }

    #[tokio::test]
    async fn test_rocksdb_cancel_frees_booking_key() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2029, 12, 2, 8, 0, 0).unwrap();

        let booking = BookingStore::insert(&store, draft()).await.unwrap().unwrap();
        assert!(
            store
                .transition(booking.id, UserId(2), Transition::cancel(now))
                .await
                .unwrap()
                .is_none()
        );
        assert!(BookingStore::insert(&store, draft()).await.unwrap().is_none());

        let cancelled = store
            .transition(booking.id, UserId(1), Transition::cancel(now))
            .await
            .unwrap()
            .unwrap();
        assert!(cancelled.is_cancelled());
        assert!(
            store
                .transition(booking.id, UserId(1), Transition::pay(now))
                .await
                .unwrap()
                .is_none()
        );

        let rebooked = BookingStore::insert(&store, draft()).await.unwrap().unwrap();
        assert_ne!(rebooked.id, booking.id);
        assert!(BookingStore::insert(&store, draft()).await.unwrap().is_none());
        assert_eq!(
            BookingStore::get(&store, booking.id).await.unwrap(),
            Some(cancelled)
        );
    }

    #[tokio::test]
    async fn test_rocksdb_seed_once() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            let seeded = store
                .insert_all_if_empty(default_trains().unwrap())
                .await
                .unwrap();
            assert_eq!(seeded, 3);
            assert_eq!(
                store
                    .insert_all_if_empty(default_trains().unwrap())
                    .await
                    .unwrap(),
                0
            );
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        assert_eq!(
            store
                .insert_all_if_empty(default_trains().unwrap())
                .await
                .unwrap(),
            0
        );
        let ids: Vec<TrainId> = store.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, [TrainId(1), TrainId(2), TrainId(3)]);
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        let id = {
            let store = RocksDBStore::open(dir.path()).unwrap();
            BookingStore::insert(&store, draft())
                .await
                .unwrap()
                .unwrap()
                .id
        };

        let store = RocksDBStore::open(dir.path()).unwrap();
        let reloaded = BookingStore::get(&store, id).await.unwrap().unwrap();
        assert_eq!(reloaded.passenger.name, "Ada");
        // The unique index and the id counter survive too
        assert!(BookingStore::insert(&store, draft()).await.unwrap().is_none());
        let mut other = draft();
        other.travel_date = NaiveDate::from_ymd_opt(2030, 1, 2).unwrap();
        let next = BookingStore::insert(&store, other).await.unwrap().unwrap();
        assert_eq!(next.id, BookingId(id.0 + 1));
    }
}
