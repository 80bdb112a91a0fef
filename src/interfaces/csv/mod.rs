pub mod booking_writer;
pub mod train_reader;
pub mod train_writer;
