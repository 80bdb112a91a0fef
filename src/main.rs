use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use railbook::application::booking::{BookingManager, BookingRequest};
use railbook::application::catalogue::{default_trains, seed_if_empty};
use railbook::application::users::UserService;
use railbook::domain::booking::{BookingId, Gender, Passenger, SeatClass};
use railbook::domain::clock::SystemClock;
use railbook::domain::payment::PaymentDetails;
use railbook::domain::train::{NewTrain, TrainId};
use railbook::domain::user::{ProfileUpdate, Registration, UserId};
use railbook::infrastructure::open_stores;
use railbook::interfaces::csv::booking_writer::BookingWriter;
use railbook::interfaces::csv::train_reader::TrainReader;
use railbook::interfaces::csv::train_writer::TrainWriter;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "RAILBOOK_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Train catalogue CSV used to seed an empty store instead of the defaults.
    #[arg(long, global = true)]
    trains: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "RAILBOOK_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the train catalogue
    Trains,
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Already-hashed password credential
        #[arg(long)]
        password_hash: String,
    },
    /// Update a user's display name and profile image
    Profile {
        #[arg(long)]
        user: u32,
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Book a seat (unpaid)
    Book {
        #[arg(long)]
        user: u32,
        #[arg(long)]
        train: u32,
        /// Travel date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        passenger: String,
        #[arg(long)]
        age: u8,
        #[arg(long)]
        gender: Gender,
        #[arg(long, default_value = "economy")]
        class: SeatClass,
    },
    /// Pay for a booking
    Pay {
        #[arg(long)]
        user: u32,
        #[arg(long)]
        booking: u32,
        #[arg(long)]
        card_name: String,
        #[arg(long)]
        card_number: String,
        /// MM/YY
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvv: String,
    },
    /// Print the ticket of a paid booking as JSON
    Ticket {
        #[arg(long)]
        user: u32,
        #[arg(long)]
        booking: u32,
    },
    /// List a user's bookings, newest first
    Bookings {
        #[arg(long)]
        user: u32,
    },
    /// Cancel an unpaid booking
    Cancel {
        #[arg(long)]
        user: u32,
        #[arg(long)]
        booking: u32,
    },
}

fn catalogue(path: Option<PathBuf>) -> Result<Vec<NewTrain>> {
    let Some(path) = path else {
        return Ok(default_trains()?);
    };
    let file = File::open(path).into_diagnostic()?;
    let mut trains = Vec::new();
    for train in TrainReader::new(file).trains() {
        match train {
            Ok(train) => trains.push(train),
            Err(e) => tracing::warn!(error = %e, "skipping catalogue line"),
        }
    }
    Ok(trains)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    railbook::logging::init(&cli.log_level);

    let stores = open_stores(cli.db_path.as_deref())?;
    seed_if_empty(stores.trains().as_ref(), catalogue(cli.trains)?).await?;

    let users = UserService::new(stores.users());
    let manager = BookingManager::new(
        stores.users(),
        stores.trains(),
        stores.bookings(),
        Box::new(SystemClock),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Trains => {
            let trains = manager.list_trains().await?;
            TrainWriter::new(out).write_trains(&trains)?;
        }
        Command::Register {
            name,
            email,
            password_hash,
        } => {
            let user = users
                .register(Registration {
                    name,
                    email,
                    password_hash,
                })
                .await?;
            writeln!(out, "registered user {} <{}>", user.id, user.email).into_diagnostic()?;
        }
        Command::Profile { user, name, image } => {
            let user = users
                .update_profile(
                    UserId(user),
                    ProfileUpdate {
                        name,
                        profile_image: image,
                    },
                )
                .await?;
            writeln!(out, "updated user {} ({})", user.id, user.name).into_diagnostic()?;
        }
        Command::Book {
            user,
            train,
            date,
            passenger,
            age,
            gender,
            class,
        } => {
            let request = BookingRequest {
                train_id: TrainId(train),
                passenger: Passenger {
                    name: passenger,
                    age,
                    gender,
                },
                travel_date: date,
                seat_class: class,
            };
            let booking = manager.create_booking(UserId(user), request).await?;
            BookingWriter::new(out).write_bookings([&booking])?;
        }
        Command::Pay {
            user,
            booking,
            card_name,
            card_number,
            expiry,
            cvv,
        } => {
            let payment = PaymentDetails {
                card_name,
                card_number,
                expiry,
                cvv,
            };
            let booking = manager
                .pay(UserId(user), BookingId(booking), &payment)
                .await?;
            BookingWriter::new(out).write_bookings([&booking])?;
        }
        Command::Ticket { user, booking } => {
            let ticket = manager.get_ticket(UserId(user), BookingId(booking)).await?;
            serde_json::to_writer_pretty(&mut out, &ticket).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
        Command::Bookings { user } => {
            let bookings = manager.list_bookings(UserId(user)).await?;
            BookingWriter::new(out).write_bookings(&bookings)?;
        }
        Command::Cancel { user, booking } => {
            let booking = manager
                .cancel_booking(UserId(user), BookingId(booking))
                .await?;
            BookingWriter::new(out).write_bookings([&booking])?;
        }
    }

    Ok(())
}
