//! Geolocation Tracker
//!
//! Tracks a device position from one primary and several auxiliary
//! position watchers, fuses the readings by accuracy, gates small movements
//! and keeps a bounded history that can be drawn on a pan/zoom map and
//! exported as CSV.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod source;
pub mod validation;
pub mod render;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{AccuracyTier, Coordinate, EntryId, GeoPoint, HistoryEntry, RefinedPosition, Sample, SourceTag};
pub use algorithms::{PositionRefiner, UpdateGate};
pub use processing::{HistoryStore, SampleBuffer};
pub use source::{MockPositionSource, PermissionState, PositionSource, Reading, SourceError, SubscriptionHandle, WatchOptions};
pub use render::{CommandRecorder, DrawSurface, FrameScheduler, Renderer, Viewport, ViewportConfig};
pub use utils::{init_logging, ConfigurationManager, LogLevel, SettingsUpdate, TrackerConfig, TrackerSettings};
pub use api::{
    ApiError, ApiResult, CsvExporter, ExportPayload, ExportSink, JsonFormatter, PositionFormatter,
    SessionEvent, SessionSnapshot, TrackingSession, TrackingStatus,
};
