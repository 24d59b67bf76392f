// Domain layer - Pure data model, no I/O
pub mod connection;
pub mod reading;
