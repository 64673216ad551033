//! Position source abstraction
//!
//! A position source hands out subscriptions ("watchers"), each configured
//! with its own [`WatchOptions`]. Readings and errors are collected with
//! [`PositionSource::poll`] and tagged with the subscription that produced
//! them.

pub mod error;
pub mod mock;

pub use error::{SourceError, SourceResult};
pub use mock::MockPositionSource;

use crate::core::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription identifier handed out by [`PositionSource::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u32);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Parameters of one watch subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Ask the provider for its most precise mode
    pub high_accuracy: bool,
    /// Maximum wait for a reading (milliseconds)
    pub timeout_ms: u32,
    /// Oldest cached reading the provider may return (milliseconds)
    pub max_cache_age_ms: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            max_cache_age_ms: 0,
        }
    }
}

impl WatchOptions {
    /// Options for the triangulation watcher `index`: the timeout grows by
    /// `timeout_step_ms` and the cache age by `cache_step_ms` per index.
    pub fn for_triangulation(&self, index: u8, timeout_step_ms: u32, cache_step_ms: u32) -> Self {
        let index = u32::from(index);
        Self {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms.saturating_add(index.saturating_mul(timeout_step_ms)),
            max_cache_age_ms: index.saturating_mul(cache_step_ms),
        }
    }
}

/// Location permission as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user has not decided yet
    Prompt,
}

/// A reading delivered to a subscription
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Provider timestamp (milliseconds since epoch)
    pub timestamp_ms: u64,
    pub coordinate: Coordinate,
}

/// One delivery from a source: a reading or an error for a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub handle: SubscriptionHandle,
    pub payload: SourceResult<Reading>,
}

/// Provider of position readings
pub trait PositionSource {
    /// Whether the host offers positioning at all
    fn is_supported(&self) -> bool;

    /// Start a subscription
    fn watch(&mut self, options: WatchOptions) -> SourceResult<SubscriptionHandle>;

    /// Stop a subscription. Returns false if the handle was not active;
    /// cancelling twice is harmless.
    fn cancel(&mut self, handle: SubscriptionHandle) -> bool;

    /// Drain pending deliveries, in arrival order
    fn poll(&mut self) -> Vec<SourceEvent>;

    /// Current permission, or `None` when the host cannot tell
    fn query_permission(&self) -> Option<PermissionState> {
        None
    }

    /// Ask the host for permission
    fn request_permission(&mut self) -> SourceResult<PermissionState> {
        Ok(PermissionState::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_watch_options() {
        let options = WatchOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout_ms, 15_000);
        assert_eq!(options.max_cache_age_ms, 0);
    }

    #[test]
    fn test_triangulation_options() {
        let base = WatchOptions::default();
        let second = base.for_triangulation(2, 1000, 500);
        assert_eq!(second.timeout_ms, 17_000);
        assert_eq!(second.max_cache_age_ms, 1000);
        assert!(second.high_accuracy);

        let zeroth = base.for_triangulation(0, 1000, 500);
        assert_eq!(zeroth, base);
    }
}
