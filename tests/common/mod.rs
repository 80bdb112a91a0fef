#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use railbook::application::booking::{BookingManager, BookingRequest};
use railbook::application::catalogue::{default_trains, seed_if_empty};
use railbook::application::users::UserService;
use railbook::domain::booking::{Gender, Passenger, SeatClass};
use railbook::domain::clock::FixedClock;
use railbook::domain::payment::PaymentDetails;
use railbook::domain::train::TrainId;
use railbook::domain::user::{Registration, User};
use railbook::infrastructure::Stores;

/// Blue Express, the first default train.
pub const BLUE_EXPRESS: TrainId = TrainId(1);
/// Coastal Mail, offers economy and sleeper only.
pub const COASTAL_MAIL: TrainId = TrainId(2);

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Harness {
    pub stores: Stores,
    pub users: UserService,
    pub manager: BookingManager,
}

/// In-memory stores seeded with the default catalogue and a clock fixed at
/// [`now`].
pub async fn harness() -> Harness {
    harness_on(Stores::in_memory()).await
}

pub async fn harness_on(stores: Stores) -> Harness {
    seed_if_empty(stores.trains().as_ref(), default_trains().unwrap())
        .await
        .unwrap();
    Harness {
        users: UserService::new(stores.users()),
        manager: BookingManager::new(
            stores.users(),
            stores.trains(),
            stores.bookings(),
            Box::new(FixedClock(now())),
        ),
        stores,
    }
}

pub async fn register(users: &UserService, email: &str) -> User {
    users
        .register(Registration {
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$stub".to_string(),
        })
        .await
        .unwrap()
}

pub fn request(train_id: TrainId, travel_date: NaiveDate) -> BookingRequest {
    BookingRequest {
        train_id,
        passenger: Passenger {
            name: "Grace Hopper".to_string(),
            age: 45,
            gender: Gender::Female,
        },
        travel_date,
        seat_class: SeatClass::Economy,
    }
}

pub fn card() -> PaymentDetails {
    PaymentDetails {
        card_name: "Grace Hopper".to_string(),
        card_number: "4111111111111111".to_string(),
        expiry: "12/31".to_string(),
        cvv: "123".to_string(),
    }
}
