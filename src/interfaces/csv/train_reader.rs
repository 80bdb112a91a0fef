use crate::domain::booking::SeatClass;
use crate::domain::money::Fare;
use crate::domain::train::NewTrain;
use crate::error::{BookingError, FieldErrors, Result};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One catalogue line as it appears in the file.
#[derive(Debug, Deserialize)]
struct TrainRecord {
    name: String,
    number: String,
    from: String,
    to: String,
    depart: String,
    arrive: String,
    fare: Decimal,
    /// `;`-separated seat classes, e.g. `economy;sleeper`.
    classes: String,
}

impl TryFrom<TrainRecord> for NewTrain {
    type Error = BookingError;

    fn try_from(record: TrainRecord) -> Result<Self> {
        let mut errors = FieldErrors::new();
        let departs = parse_time(&record.depart, "depart", &mut errors);
        let arrives = parse_time(&record.arrive, "arrive", &mut errors);

        let mut classes = Vec::new();
        for raw in record.classes.split(';').filter(|c| !c.trim().is_empty()) {
            match raw.parse::<SeatClass>() {
                Ok(class) if !classes.contains(&class) => classes.push(class),
                Ok(_) => {}
                Err(e) => errors.push("classes", e),
            }
        }
        if classes.is_empty() && !errors.has_field("classes") {
            errors.push("classes", "At least one seat class is required");
        }

        let base_fare = match Fare::new(record.fare) {
            Ok(fare) => Some(fare),
            Err(BookingError::Validation(e)) => {
                errors.append(e);
                None
            }
            Err(e) => return Err(e),
        };

        match (departs, arrives, base_fare) {
            (Some(departs), Some(arrives), Some(base_fare)) if errors.is_empty() => Ok(Self {
                name: record.name,
                number: record.number,
                from_station: record.from,
                to_station: record.to,
                departs,
                arrives,
                base_fare,
                classes,
            }),
            _ => Err(BookingError::Validation(errors)),
        }
    }
}

fn parse_time(value: &str, field: &str, errors: &mut FieldErrors) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(time) => Some(time),
        Err(_) => {
            errors.push(field, format!("'{value}' is not a HH:MM time"));
            None
        }
    }
}

/// Reads a train catalogue from a CSV source.
///
/// Header: `name,number,from,to,depart,arrive,fare,classes`.
pub struct TrainReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TrainReader<R> {
    /// Creates a new `TrainReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts each line. Malformed lines come back as
    /// errors without stopping the iteration.
    pub fn trains(self) -> impl Iterator<Item = Result<NewTrain>> {
        self.reader.into_deserialize().map(|result| {
            let record: TrainRecord = result?;
            NewTrain::try_from(record)
        })
    }
}
