//! Command implementations for testgenie
//!
//! Each command is implemented in its own module.

pub mod config;
pub mod detect;
pub mod generate;
pub mod languages;
pub mod story;
pub mod symbols;
