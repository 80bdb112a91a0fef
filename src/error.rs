use crate::domain::booking::BookingId;
use crate::domain::train::TrainId;
use chrono::NaiveDate;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// A single validation failure attached to the input field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every validation failure found in one request, in the order discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Folds the failures reported by a `validator` derive into this list.
    ///
    /// Fields are sorted by name so the output is stable across runs.
    pub fn extend_from(&mut self, errors: validator::ValidationErrors) {
        let mut fields: Vec<_> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (field.to_string(), errs.clone()))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, errs) in fields {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", err.code));
                // Two rules on one field may report the same message
                if !self.for_field(&field).any(|m| m == message) {
                    self.push(field.clone(), message);
                }
            }
        }
    }

    pub fn append(&mut self, mut other: FieldErrors) {
        self.0.append(&mut other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Messages reported for `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BookingError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::new();
        out.extend_from(errors);
        out
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum BookingError {
    #[error("Invalid input: {0}")]
    #[diagnostic(code(railbook::validation), help("correct the listed fields and retry"))]
    Validation(FieldErrors),

    #[error("A booking for train {train} on {travel_date} already exists")]
    #[diagnostic(
        code(railbook::duplicate_booking),
        help("pay for or cancel the existing booking instead")
    )]
    DuplicateBooking {
        train: TrainId,
        travel_date: NaiveDate,
    },

    #[error("Booking {0} cannot be changed")]
    #[diagnostic(code(railbook::invalid_booking_state))]
    InvalidBookingState(BookingId),

    #[error("Not found")]
    #[diagnostic(code(railbook::not_found))]
    NotFound,

    #[error("Email already registered")]
    #[diagnostic(code(railbook::email_taken))]
    EmailTaken,

    #[error("Storage error: {0}")]
    #[diagnostic(code(railbook::storage))]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("CSV error: {0}")]
    #[diagnostic(code(railbook::csv))]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(railbook::io))]
    Io(#[from] std::io::Error),
}

impl BookingError {
    /// Wraps any persistence-layer failure into the unclassified storage variant.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Storage(err.into())
    }

    /// Shorthand for a validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(field, message);
        Self::Validation(errors)
    }
}

impl From<FieldErrors> for BookingError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for BookingError {
    fn from(err: rocksdb::Error) -> Self {
        Self::storage(err)
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
