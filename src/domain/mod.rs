//! Domain model: value objects, entities, the booking state machine and the
//! ports the application layer talks to.

pub mod booking;
pub mod clock;
pub mod money;
pub mod payment;
pub mod ports;
pub mod train;
pub mod user;
pub mod validation;
