use super::validation::{digits_only, expiry_format, letters_and_spaces, parse_expiry};
use crate::error::{FieldErrors, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use validator::Validate;

/// Card details for the simulated gateway. Only the shape is checked; nothing
/// is charged and nothing is stored.
#[derive(Clone, Validate)]
pub struct PaymentDetails {
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        custom(function = "letters_and_spaces")
    )]
    pub card_name: String,
    #[validate(
        length(min = 13, max = 19, message = "Card number must be between 13 and 19 digits"),
        custom(function = "digits_only")
    )]
    pub card_number: String,
    #[validate(custom(function = "expiry_format"))]
    pub expiry: String,
    #[validate(
        length(min = 3, max = 4, message = "CVV must be 3 or 4 digits"),
        custom(function = "digits_only")
    )]
    pub cvv: String,
}

impl PaymentDetails {
    /// Checks the card shape and that it has not expired by `today`.
    /// A card is valid through the last day of its expiry month.
    pub fn validate_on(&self, today: NaiveDate) -> Result<()> {
        let mut errors = FieldErrors::new();
        if let Err(e) = self.validate() {
            errors.extend_from(e);
        }
        if let Some((year, month)) = parse_expiry(&self.expiry)
            && (year, month) < (today.year(), today.month())
        {
            errors.push("expiry", "Card has expired");
        }
        errors.into_result()
    }

    fn masked_number(&self) -> String {
        let len = self.card_number.chars().count();
        let tail: String = self.card_number.chars().skip(len.saturating_sub(4)).collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_name", &self.card_name)
            .field("card_number", &self.masked_number())
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}
