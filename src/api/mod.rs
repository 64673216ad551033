//! Session-level API
//!
//! The [`TrackingSession`] context object, its events and errors, CSV export
//! and display formatting.

pub mod types;
pub mod export;
pub mod formatting;
pub mod session;

// Re-export commonly used API types
pub use types::{ApiError, ApiResult, SessionEvent, TrackingStatus};
pub use export::{CsvExporter, DirectorySink, ExportError, ExportPayload, ExportSink, MemorySink};
pub use formatting::{HistoryRow, JsonFormatter, PositionDisplay, PositionFormatter, SessionSnapshot};
pub use session::{CallbackHandle, EventCallback, SessionStats, TrackingSession};
