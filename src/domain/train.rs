use super::booking::SeatClass;
use super::money::Fare;
use crate::error::{BookingError, Result};
use chrono::{NaiveTime, TimeDelta};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub u32);

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything needed to add a train to the catalogue; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrain {
    pub name: String,
    pub number: String,
    pub from_station: String,
    pub to_station: String,
    pub departs: NaiveTime,
    pub arrives: NaiveTime,
    pub base_fare: Fare,
    pub classes: Vec<SeatClass>,
}

impl NewTrain {
    pub fn with_id(self, id: TrainId) -> Train {
        Train {
            id,
            name: self.name,
            number: self.number,
            from_station: self.from_station,
            to_station: self.to_station,
            departs: self.departs,
            arrives: self.arrives,
            base_fare: self.base_fare,
            classes: self.classes,
        }
    }
}

/// A scheduled route. Reference data: the booking flow only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub name: String,
    pub number: String,
    pub from_station: String,
    pub to_station: String,
    pub departs: NaiveTime,
    pub arrives: NaiveTime,
    pub base_fare: Fare,
    pub classes: Vec<SeatClass>,
}

impl Train {
    /// Time on board. An arrival earlier than the departure lands the next day.
    pub fn duration(&self) -> TimeDelta {
        let delta = self.arrives - self.departs;
        if delta < TimeDelta::zero() {
            delta + TimeDelta::days(1)
        } else {
            delta
        }
    }

    /// Human readable duration, e.g. `4h 30m`.
    pub fn duration_label(&self) -> String {
        let minutes = self.duration().num_minutes();
        format!("{}h {}m", minutes / 60, minutes % 60)
    }

    pub fn offers(&self, class: SeatClass) -> bool {
        self.classes.contains(&class)
    }

    /// Price of one seat in `class`, or a `seat_class` field error when the
    /// train does not carry that class.
    pub fn fare_for(&self, class: SeatClass) -> Result<Fare> {
        if self.offers(class) {
            Ok(self.base_fare * class.multiplier())
        } else {
            Err(BookingError::field(
                "seat_class",
                format!("{} does not offer {} seats", self.name, class),
            ))
        }
    }
}

fn time(h: u32, m: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
        .ok_or_else(|| BookingError::storage(format!("invalid catalogue time {h:02}:{m:02}")))
}

/// The catalogue installed into an empty store.
pub fn default_trains() -> Result<Vec<NewTrain>> {
    Ok(vec![
        NewTrain {
            name: "Blue Express".to_string(),
            number: "BE123".to_string(),
            from_station: "City A".to_string(),
            to_station: "City B".to_string(),
            departs: time(8, 0)?,
            arrives: time(12, 30)?,
            base_fare: Fare::new(dec!(450.00))?,
            classes: vec![SeatClass::Economy, SeatClass::Sleeper, SeatClass::Ac],
        },
        NewTrain {
            name: "Coastal Mail".to_string(),
            number: "CM456".to_string(),
            from_station: "City A".to_string(),
            to_station: "City C".to_string(),
            departs: time(9, 45)?,
            arrives: time(15, 0)?,
            base_fare: Fare::new(dec!(650.00))?,
            classes: vec![SeatClass::Economy, SeatClass::Sleeper],
        },
        NewTrain {
            name: "Sunrise Special".to_string(),
            number: "SS789".to_string(),
            from_station: "City B".to_string(),
            to_station: "City C".to_string(),
            departs: time(16, 0)?,
            arrives: time(19, 30)?,
            base_fare: Fare::new(dec!(520.00))?,
            classes: vec![SeatClass::Economy, SeatClass::Ac],
        },
    ])
}
