use crate::domain::booking::Booking;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Flat CSV shape of a booking. `paid`, `transaction_id` and `paid_at` are
/// all derived from the booking state, so they always agree.
#[derive(Serialize)]
struct BookingRow<'a> {
    id: u32,
    train: u32,
    passenger: &'a str,
    age: u8,
    travel_date: String,
    seat_class: &'static str,
    fare: String,
    status: &'static str,
    paid: bool,
    transaction_id: Option<String>,
    booked_at: String,
    paid_at: Option<String>,
}

impl<'a> From<&'a Booking> for BookingRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            id: booking.id.0,
            train: booking.train_id.0,
            passenger: &booking.passenger.name,
            age: booking.passenger.age,
            travel_date: booking.travel_date.to_string(),
            seat_class: booking.seat_class.as_str(),
            fare: booking.fare.to_string(),
            status: booking.state.label(),
            paid: booking.is_paid(),
            transaction_id: booking.transaction_id().map(|t| t.to_string()),
            booked_at: booking.booked_at.to_rfc3339(),
            paid_at: booking.paid_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// Writes bookings as CSV, one row per booking.
pub struct BookingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BookingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_bookings<'a, I>(&mut self, bookings: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        for booking in bookings {
            self.writer.serialize(BookingRow::from(booking))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{
        BookingDraft, BookingId, Gender, Passenger, SeatClass, Transition,
    };
    use crate::domain::money::Fare;
    use crate::domain::train::TrainId;
    use crate::domain::user::UserId;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn booking(id: u32) -> Booking {
        BookingDraft {
            user_id: UserId(1),
            train_id: TrainId(2),
            passenger: Passenger {
                name: "Ada Lovelace".to_string(),
                age: 36,
                gender: Gender::Female,
            },
            travel_date: NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(),
            seat_class: SeatClass::Sleeper,
            fare: Fare::new(dec!(975)).unwrap(),
            booked_at: Utc.with_ymd_and_hms(2030, 2, 1, 9, 30, 0).unwrap(),
        }
        .with_id(BookingId(id))
    }

    #[test]
    fn test_write_unpaid_and_paid() {
        let unpaid = booking(1);
        let mut paid = booking(2);
        paid.apply(Transition::pay(Utc.with_ymd_and_hms(2030, 2, 2, 10, 0, 0).unwrap()))
            .unwrap();

        let mut out = Vec::new();
        BookingWriter::new(&mut out)
            .write_bookings([&unpaid, &paid])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,train,passenger,age,travel_date,seat_class,fare,status,paid,transaction_id,booked_at,paid_at"
        );
        assert_eq!(
            lines[1],
            "1,2,Ada Lovelace,36,2030-03-01,sleeper,975.00,created,false,,2030-02-01T09:30:00+00:00,"
        );
        assert!(lines[2].starts_with("2,2,Ada Lovelace,36,2030-03-01,sleeper,975.00,paid,true,"));
        assert!(lines[2].ends_with(",2030-02-01T09:30:00+00:00,2030-02-02T10:00:00+00:00"));
    }
}
