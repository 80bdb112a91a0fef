use super::money::Fare;
use super::train::TrainId;
use super::user::UserId;
use super::validation::letters_and_spaces;
use crate::error::{BookingError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u32);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque token issued when a booking is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fare tier. The multiplier is applied to the train's base fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    Economy,
    Sleeper,
    Ac,
}

impl SeatClass {
    pub fn multiplier(self) -> Decimal {
        match self {
            Self::Economy => dec!(1.0),
            Self::Sleeper => dec!(1.5),
            Self::Ac => dec!(2.5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Sleeper => "sleeper",
            Self::Ac => "ac",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "sleeper" => Ok(Self::Sleeper),
            "ac" => Ok(Self::Ac),
            other => Err(format!("unknown seat class '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Passenger {
    #[validate(
        length(min = 2, max = 120, message = "Name must be between 2 and 120 characters"),
        custom(function = "letters_and_spaces")
    )]
    pub name: String,
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: u8,
    pub gender: Gender,
}

/// The uniqueness key: at most one live booking per user, train and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookingKey {
    pub user_id: UserId,
    pub train_id: TrainId,
    pub travel_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BookingState {
    Created,
    Paid {
        transaction_id: TransactionId,
        paid_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
    },
}

impl BookingState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid { .. } => "paid",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// A validated booking that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub user_id: UserId,
    pub train_id: TrainId,
    pub passenger: Passenger,
    pub travel_date: NaiveDate,
    pub seat_class: SeatClass,
    pub fare: Fare,
    pub booked_at: DateTime<Utc>,
}

impl BookingDraft {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            user_id: self.user_id,
            train_id: self.train_id,
            travel_date: self.travel_date,
        }
    }

    /// Materialises the row in its initial unpaid state.
    pub fn with_id(self, id: BookingId) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            train_id: self.train_id,
            passenger: self.passenger,
            travel_date: self.travel_date,
            seat_class: self.seat_class,
            fare: self.fare,
            booked_at: self.booked_at,
            state: BookingState::Created,
        }
    }
}

/// A reservation of one seat. The fare is frozen when the booking is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub train_id: TrainId,
    pub passenger: Passenger,
    pub travel_date: NaiveDate,
    pub seat_class: SeatClass,
    pub fare: Fare,
    pub booked_at: DateTime<Utc>,
    pub state: BookingState,
}

impl Booking {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            user_id: self.user_id,
            train_id: self.train_id,
            travel_date: self.travel_date,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.state, BookingState::Paid { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, BookingState::Cancelled { .. })
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self.state {
            BookingState::Paid { transaction_id, .. } => Some(transaction_id),
            _ => None,
        }
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            BookingState::Paid { paid_at, .. } => Some(paid_at),
            _ => None,
        }
    }

    /// Applies `transition` if the booking is still unpaid and uncancelled.
    /// The booking is left untouched on error.
    pub fn apply(&mut self, transition: Transition) -> Result<()> {
        if self.state != BookingState::Created {
            return Err(BookingError::InvalidBookingState(self.id));
        }
        self.state = match transition {
            Transition::Pay {
                transaction_id,
                paid_at,
            } => BookingState::Paid {
                transaction_id,
                paid_at,
            },
            Transition::Cancel { cancelled_at } => BookingState::Cancelled { cancelled_at },
        };
        Ok(())
    }
}

/// The two ways out of `Created`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Pay {
        transaction_id: TransactionId,
        paid_at: DateTime<Utc>,
    },
    Cancel {
        cancelled_at: DateTime<Utc>,
    },
}

impl Transition {
    pub fn pay(now: DateTime<Utc>) -> Self {
        Self::Pay {
            transaction_id: TransactionId::generate(),
            paid_at: now,
        }
    }

    pub fn cancel(now: DateTime<Utc>) -> Self {
        Self::Cancel { cancelled_at: now }
    }
}
