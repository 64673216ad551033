//! Shared API types: errors, status and session events

use crate::api::export::ExportError;
use crate::core::{EntryId, GeoPoint, RefinedPosition, SourceTag};
use crate::source::{PermissionState, SourceError};
use crate::utils::config::{ConfigError, TrackerSettings};
use crate::validation::ReadingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API error types
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Position source failure
    SourceError { error: SourceError },
    /// Rejected configuration
    ConfigurationError { error: ConfigError },
    /// Export failure
    ExportError { error: ExportError },
    /// Invalid request parameters
    InvalidRequest { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::SourceError { error } => write!(f, "Position source error: {}", error),
            ApiError::ConfigurationError { error } => write!(f, "Configuration error: {}", error),
            ApiError::ExportError { error } => write!(f, "Export error: {}", error),
            ApiError::InvalidRequest { reason } => write!(f, "Invalid request: {}", reason),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<SourceError> for ApiError {
    fn from(error: SourceError) -> Self {
        ApiError::SourceError { error }
    }
}

impl From<ConfigError> for ApiError {
    fn from(error: ConfigError) -> Self {
        ApiError::ConfigurationError { error }
    }
}

impl From<ExportError> for ApiError {
    fn from(error: ExportError) -> Self {
        ApiError::ExportError { error }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    /// Not tracking
    Idle,
    /// Watchers started, waiting for the first reading
    Connecting,
    /// Readings are arriving
    Online,
    /// The last delivery was an error
    Offline,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrackingStatus::Idle => "idle",
            TrackingStatus::Connecting => "connecting",
            TrackingStatus::Online => "online",
            TrackingStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Events emitted by a tracking session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged {
        old_status: TrackingStatus,
        new_status: TrackingStatus,
    },
    /// The host must ask the user for location permission
    PermissionRequired,
    PermissionChanged { state: PermissionState },
    /// A reading refreshed the fused estimate
    EstimateUpdated {
        source: SourceTag,
        estimate: RefinedPosition,
    },
    /// The gate accepted an estimate into the history
    PositionCommitted { id: EntryId, position: RefinedPosition },
    /// The map got its reference center
    ReferenceCenterSet { center: GeoPoint },
    /// A source error, with the guidance to show for it
    SourceFailed {
        source: Option<SourceTag>,
        error: SourceError,
        guidance: Vec<String>,
    },
    ReadingRejected { source: SourceTag, error: ReadingError },
    TrackingStarted { watchers: usize },
    TrackingStopped,
    HistoryCleared,
    SettingsApplied { settings: TrackerSettings },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let api: ApiError = SourceError::PermissionDenied.into();
        assert_eq!(api, ApiError::SourceError { error: SourceError::PermissionDenied });

        let api: ApiError = ExportError::EmptyHistory.into();
        assert!(api.to_string().contains("nothing to export"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(TrackingStatus::Online.to_string(), "online");
        assert_eq!(serde_json::to_string(&TrackingStatus::Connecting).unwrap(), "\"connecting\"");
    }
}
