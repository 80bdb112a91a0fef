mod common;

use common::{BLUE_EXPRESS, COASTAL_MAIL, Harness, card, date, harness, register, request};
use rand::Rng;
use railbook::domain::booking::BookingKey;
use railbook::error::BookingError;
use std::collections::HashSet;
use std::sync::Arc;

const CONTENDERS: usize = 16;

async fn payments_settle_once(h: Harness) {
    let user = register(&h.users, "grace@example.com").await;
    let booking = h
        .manager
        .create_booking(user.id, request(BLUE_EXPRESS, date(2030, 7, 1)))
        .await
        .unwrap();

    let (user_id, booking_id) = (user.id, booking.id);
    let manager = Arc::new(h.manager);
    let mut handles = Vec::new();
    for _ in 0..CONTENDERS {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.pay(user_id, booking_id, &card()).await
        }));
    }

    let mut winners = Vec::new();
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(paid) => winners.push(paid),
            Err(BookingError::InvalidBookingState(_)) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(rejected, CONTENDERS - 1);

    let stored = manager.list_bookings(user.id).await.unwrap();
    assert_eq!(stored[0].transaction_id(), winners[0].transaction_id());
}

async fn creates_keep_one(h: Harness) {
    let user = register(&h.users, "grace@example.com").await;

    let user_id = user.id;
    let manager = Arc::new(h.manager);
    let mut handles = Vec::new();
    for _ in 0..CONTENDERS {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .create_booking(user_id, request(BLUE_EXPRESS, date(2030, 7, 1)))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(BookingError::DuplicateBooking { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(manager.list_bookings(user.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_settle_once() {
    payments_settle_once(harness().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_one() {
    creates_keep_one(harness().await).await;
}

#[cfg(feature = "storage-rocksdb")]
mod persistent {
    use super::*;
    use crate::common::harness_on;
    use railbook::application::catalogue::{default_trains, seed_if_empty};
    use railbook::infrastructure::Stores;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_concurrent_payments_settle_once() {
        let dir = tempdir().unwrap();
        let stores = Stores::rocksdb(&dir.path().join("db")).unwrap();
        payments_settle_once(harness_on(stores).await).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_concurrent_creates_keep_one() {
        let dir = tempdir().unwrap();
        let stores = Stores::rocksdb(&dir.path().join("db")).unwrap();
        creates_keep_one(harness_on(stores).await).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_concurrent_seeders_install_once() {
        let dir = tempdir().unwrap();
        let stores = Stores::rocksdb(&dir.path().join("db")).unwrap();

        let mut handles = Vec::new();
        for _ in 0..CONTENDERS {
            let stores = stores.clone();
            handles.push(tokio::spawn(async move {
                seed_if_empty(stores.trains().as_ref(), default_trains().unwrap())
                    .await
                    .unwrap()
            }));
        }

        let mut seeded = 0;
        for handle in handles {
            seeded += handle.await.unwrap();
        }
        assert_eq!(seeded, 3);
        assert_eq!(stores.trains().list().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_random_requests_never_duplicate() {
    let h = harness().await;
    let users = [
        register(&h.users, "grace@example.com").await,
        register(&h.users, "ada@example.com").await,
    ];
    let trains = [BLUE_EXPRESS, COASTAL_MAIL];
    let mut rng = rand::thread_rng();

    let mut expected = HashSet::new();
    for _ in 0..200 {
        let user = &users[rng.gen_range(0..users.len())];
        let train = trains[rng.gen_range(0..trains.len())];
        let day = date(2030, 7, rng.gen_range(1..=5));

        let fresh = expected.insert((user.id, train, day));
        match h.manager.create_booking(user.id, request(train, day)).await {
            Ok(_) => assert!(fresh, "accepted a second booking for {train} on {day}"),
            Err(BookingError::DuplicateBooking { .. }) => assert!(!fresh),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    for user in &users {
        let bookings = h.manager.list_bookings(user.id).await.unwrap();
        let keys: HashSet<BookingKey> = bookings.iter().map(|b| b.key()).collect();
        assert_eq!(keys.len(), bookings.len());
    }
    let stored = h.manager.list_bookings(users[0].id).await.unwrap().len()
        + h.manager.list_bookings(users[1].id).await.unwrap().len();
    assert_eq!(stored, expected.len());
}
