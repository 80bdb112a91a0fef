use crate::domain::train::Train;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TrainRow<'a> {
    id: u32,
    name: &'a str,
    number: &'a str,
    from: &'a str,
    to: &'a str,
    depart: String,
    arrive: String,
    duration: String,
    fare: String,
    classes: String,
}

impl<'a> From<&'a Train> for TrainRow<'a> {
    fn from(train: &'a Train) -> Self {
        Self {
            id: train.id.0,
            name: &train.name,
            number: &train.number,
            from: &train.from_station,
            to: &train.to_station,
            depart: train.departs.format("%H:%M").to_string(),
            arrive: train.arrives.format("%H:%M").to_string(),
            duration: train.duration_label(),
            fare: train.base_fare.to_string(),
            classes: train
                .classes
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Writes the train catalogue as CSV.
pub struct TrainWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TrainWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_trains(&mut self, trains: &[Train]) -> Result<()> {
        for train in trains {
            self.writer.serialize(TrainRow::from(train))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
