//! Core types and constants for the tracking pipeline

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
