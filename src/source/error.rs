//! Position source error types

use std::fmt;

/// Failures reported by a position source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The user or platform refused location access
    PermissionDenied,
    /// The provider could not determine a position
    PositionUnavailable,
    /// No reading arrived within the watch timeout
    Timeout { timeout_ms: u32 },
    /// The host has no position provider at all
    Unsupported,
    /// Anything the provider could not classify
    Unknown { message: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::PermissionDenied => write!(f, "Location permission denied"),
            SourceError::PositionUnavailable => write!(f, "Position unavailable"),
            SourceError::Timeout { timeout_ms } => {
                write!(f, "Timed out after {}ms waiting for a position", timeout_ms)
            }
            SourceError::Unsupported => write!(f, "Geolocation is not supported on this host"),
            SourceError::Unknown { message } if message.is_empty() => {
                write!(f, "Unknown error: no details available")
            }
            SourceError::Unknown { message } => write!(f, "Unknown error: {}", message),
        }
    }
}

impl std::error::Error for SourceError {}

/// Result type for position source operations
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Map a numeric provider error code (1 denied, 2 unavailable, 3 timeout)
    pub fn from_code(code: u16, message: &str, timeout_ms: u32) -> Self {
        match code {
            1 => SourceError::PermissionDenied,
            2 => SourceError::PositionUnavailable,
            3 => SourceError::Timeout { timeout_ms },
            _ => SourceError::Unknown { message: message.to_string() },
        }
    }

    /// Numeric code of this error; 0 for errors outside the provider codes
    pub fn code(&self) -> u16 {
        match self {
            SourceError::PermissionDenied => 1,
            SourceError::PositionUnavailable => 2,
            SourceError::Timeout { .. } => 3,
            SourceError::Unsupported | SourceError::Unknown { .. } => 0,
        }
    }

    /// Terminal errors end the tracking session; the rest are surfaced while
    /// the watchers stay active.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceError::PermissionDenied | SourceError::Unsupported)
    }

    /// Steps the user can take to resolve the error
    pub fn guidance(&self) -> &'static [&'static str] {
        match self {
            SourceError::PermissionDenied => &[
                "Check the browser or OS privacy settings",
                "Allow location access for this site or application",
                "On mobile devices, check the app's location permission",
            ],
            SourceError::PositionUnavailable => &[
                "Make sure GPS or location services are enabled",
                "Indoors, move closer to a window or open area",
                "Restart the device or the application",
                "On mobile devices, check the battery saver mode",
            ],
            SourceError::Timeout { .. } => &[
                "Check the network connection",
                "Try again somewhere with a better GPS signal",
                "Restart the application",
                "On mobile devices, turn GPS off and on again",
            ],
            SourceError::Unsupported => &[
                "Use a device or browser with geolocation support",
            ],
            SourceError::Unknown { .. } => &[
                "Reload the application",
                "Check that the platform supports geolocation",
                "Try a different device or browser",
            ],
        }
    }
}
