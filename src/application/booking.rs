use crate::domain::booking::{
    Booking, BookingDraft, BookingId, Passenger, SeatClass, TransactionId, Transition,
};
use crate::domain::clock::ClockBox;
use crate::domain::money::Fare;
use crate::domain::payment::PaymentDetails;
use crate::domain::ports::{BookingStoreBox, TrainStoreBox, UserStoreBox};
use crate::domain::train::{Train, TrainId};
use crate::domain::user::UserId;
use crate::error::{BookingError, FieldErrors, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use validator::Validate;

/// What the caller asks for when booking a seat.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub train_id: TrainId,
    pub passenger: Passenger,
    pub travel_date: NaiveDate,
    pub seat_class: SeatClass,
}

/// Printable view of a paid booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub booking_id: BookingId,
    pub transaction_id: TransactionId,
    pub paid_at: DateTime<Utc>,
    pub passenger: Passenger,
    pub travel_date: NaiveDate,
    pub seat_class: SeatClass,
    pub fare: Fare,
    pub train_name: String,
    pub train_number: String,
    pub from_station: String,
    pub to_station: String,
    pub departs: NaiveTime,
    pub arrives: NaiveTime,
    pub duration: String,
}

/// Owns the booking lifecycle: creation, payment, cancellation and tickets.
///
/// The manager keeps no state of its own between calls. Uniqueness and
/// at-most-once payment are enforced by the `BookingStore` in a single unit of
/// work, so any number of managers may share one store.
pub struct BookingManager {
    users: UserStoreBox,
    trains: TrainStoreBox,
    bookings: BookingStoreBox,
    clock: ClockBox,
}

impl BookingManager {
    /// Creates a new `BookingManager`.
    ///
    /// # Arguments
    ///
    /// * `users` - Used to check that the booking user exists.
    /// * `trains` - The read-only train catalogue.
    /// * `bookings` - Where bookings live.
    /// * `clock` - The server clock, for travel-date and card-expiry checks.
    pub fn new(
        users: UserStoreBox,
        trains: TrainStoreBox,
        bookings: BookingStoreBox,
        clock: ClockBox,
    ) -> Self {
        Self {
            users,
            trains,
            bookings,
            clock,
        }
    }

    /// Books one seat in the `Created` (unpaid) state.
    ///
    /// All input problems are reported together as a `Validation` error. If the
    /// user already holds a live booking for the same train and day the call
    /// fails with `DuplicateBooking` and nothing is written.
    #[tracing::instrument(skip(self, request), fields(train = %request.train_id, date = %request.travel_date))]
    pub async fn create_booking(&self, user_id: UserId, request: BookingRequest) -> Result<Booking> {
        if self.users.get(user_id).await?.is_none() {
            return Err(BookingError::NotFound);
        }

        let mut errors = FieldErrors::new();
        let mut passenger = request.passenger;
        passenger.name = passenger.name.trim().to_string();
        if let Err(e) = passenger.validate() {
            errors.extend_from(e);
        }

        let today = self.clock.today();
        if request.travel_date < today {
            errors.push("travel_date", "Travel date cannot be in the past");
        }

        let fare = match self.trains.get(request.train_id).await? {
            Some(train) => match train.fare_for(request.seat_class) {
                Ok(fare) => Some(fare),
                Err(BookingError::Validation(e)) => {
                    errors.append(e);
                    None
                }
                Err(e) => return Err(e),
            },
            None => {
                errors.push("train_id", "Selected train not found");
                None
            }
        };

        // A missing fare always comes with a field error explaining why
        let Some(fare) = fare.filter(|_| errors.is_empty()) else {
            return Err(BookingError::Validation(errors));
        };

        let draft = BookingDraft {
            user_id,
            train_id: request.train_id,
            passenger,
            travel_date: request.travel_date,
            seat_class: request.seat_class,
            fare,
            booked_at: self.clock.now(),
        };

        match self.bookings.insert(draft).await? {
            Some(booking) => {
                tracing::info!(booking = %booking.id, fare = %booking.fare, "booking created");
                Ok(booking)
            }
            None => {
                tracing::warn!("duplicate booking rejected");
                Err(BookingError::DuplicateBooking {
                    train: request.train_id,
                    travel_date: request.travel_date,
                })
            }
        }
    }

    /// Settles an unpaid booking.
    ///
    /// Card details are checked before the store is touched. The store then
    /// flips `Created` to `Paid` only if the booking still is `Created` and
    /// belongs to `user_id`; unknown ids, foreign bookings and repeat payments
    /// all come back as `InvalidBookingState`.
    #[tracing::instrument(skip(self, payment))]
    pub async fn pay(
        &self,
        user_id: UserId,
        booking_id: BookingId,
        payment: &PaymentDetails,
    ) -> Result<Booking> {
        payment.validate_on(self.clock.today())?;

        let transition = Transition::pay(self.clock.now());
        match self.bookings.transition(booking_id, user_id, transition).await? {
            Some(booking) => {
                tracing::info!(booking = %booking.id, "payment accepted");
                Ok(booking)
            }
            None => {
                tracing::warn!("payment rejected for booking in invalid state");
                Err(BookingError::InvalidBookingState(booking_id))
            }
        }
    }

    /// Abandons an unpaid booking so the same train and day can be booked again.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking> {
        let transition = Transition::cancel(self.clock.now());
        match self.bookings.transition(booking_id, user_id, transition).await? {
            Some(booking) => {
                tracing::info!("booking cancelled");
                Ok(booking)
            }
            None => {
                tracing::warn!("cancellation rejected for booking in invalid state");
                Err(BookingError::InvalidBookingState(booking_id))
            }
        }
    }

    /// The ticket for a paid booking owned by `user_id`.
    ///
    /// Missing, unpaid and foreign bookings are indistinguishable: all three
    /// yield `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn get_ticket(&self, user_id: UserId, booking_id: BookingId) -> Result<Ticket> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or(BookingError::NotFound)?;
        let (Some(transaction_id), Some(paid_at)) = (booking.transaction_id(), booking.paid_at())
        else {
            return Err(BookingError::NotFound);
        };
        let train = self
            .trains
            .get(booking.train_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        Ok(Ticket {
            booking_id: booking.id,
            transaction_id,
            paid_at,
            duration: train.duration_label(),
            passenger: booking.passenger,
            travel_date: booking.travel_date,
            seat_class: booking.seat_class,
            fare: booking.fare,
            train_name: train.name,
            train_number: train.number,
            from_station: train.from_station,
            to_station: train.to_station,
            departs: train.departs,
            arrives: train.arrives,
        })
    }

    /// The user's bookings, newest first.
    pub async fn list_bookings(&self, user_id: UserId) -> Result<Vec<Booking>> {
        self.bookings.list_for_user(user_id).await
    }

    /// The catalogue, ordered by departure time.
    pub async fn list_trains(&self) -> Result<Vec<Train>> {
        self.trains.list().await
    }
}
