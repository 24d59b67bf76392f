// Application layer - Use cases and session state
pub mod chart_sync;
pub mod history;
pub mod normalizer;
pub mod retry;
pub mod session;
