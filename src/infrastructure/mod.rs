// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod manager;
pub mod serial;
pub mod transport;
