//! Adapters between the outside world (files, the terminal) and the domain.

pub mod csv;
