//! testgenie - unit test generation library
//!
//! Extracts function and class symbols with tree-sitter, asks a generation
//! service for test code, and writes the result without clobbering existing
//! files.

pub mod app;
pub mod cli;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{TestGenieError, TestGenieResult};
