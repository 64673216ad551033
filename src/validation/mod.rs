//! Input validation

pub mod reading;

pub use reading::{ReadingError, ReadingValidator};
