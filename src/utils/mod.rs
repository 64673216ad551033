//! Configuration and logging setup

pub mod config;
pub mod logging;

pub use config::{ConfigurationManager, LogLevel, SettingsUpdate, TrackerConfig, TrackerSettings};
pub use logging::init_logging;
