use crate::error::{BookingError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

/// A positive monetary amount with cent precision.
///
/// Wraps `rust_decimal::Decimal` so fares can never be zero or negative and
/// always carry exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Fare(Decimal);

impl Fare {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value.round_dp(2)))
        } else {
            Err(BookingError::field("fare", "Fare must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Fare {
    type Error = BookingError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Fare> for Decimal {
    fn from(fare: Fare) -> Self {
        fare.0
    }
}

/// Scaling by a positive multiplier keeps the fare positive.
impl Mul<Decimal> for Fare {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self((self.0 * rhs).round_dp(2))
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
