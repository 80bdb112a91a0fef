//! Application layer: the services the outside world calls.
//!
//! Services hold boxed ports and no other state, so each call is independent
//! and all consistency guarantees come from the stores.

pub mod booking;
pub mod catalogue;
pub mod users;
