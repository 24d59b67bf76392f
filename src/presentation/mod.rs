// Presentation layer - console rendering and operator input
pub mod commands;
pub mod display;
