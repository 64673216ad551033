//! In-memory position source for tests and simulations

use crate::algorithms::geodesy;
use crate::core::Coordinate;
use crate::source::{
    PermissionState, PositionSource, Reading, SourceError, SourceEvent, SourceResult,
    SubscriptionHandle, WatchOptions,
};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// Scripted position source.
///
/// Readings pushed with [`MockPositionSource::push_reading`] are delivered to
/// every active subscription. Optional jitter and simulated timeouts make the
/// subscriptions disagree the way independent watchers do.
pub struct MockPositionSource {
    supported: bool,
    permission: Option<PermissionState>,
    permission_answer: PermissionState,
    subscriptions: BTreeMap<SubscriptionHandle, WatchOptions>,
    next_handle: u32,
    pending: VecDeque<SourceEvent>,
    jitter_m: f64,
    error_probability: f64,
    rng: StdRng,
}

impl MockPositionSource {
    /// Supported source with permission granted
    pub fn new() -> Self {
        Self::with_seed(0x6e0_7a4c)
    }

    /// Like [`MockPositionSource::new`] with a fixed jitter seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            supported: true,
            permission: Some(PermissionState::Granted),
            permission_answer: PermissionState::Granted,
            subscriptions: BTreeMap::new(),
            next_handle: 1,
            pending: VecDeque::new(),
            jitter_m: 0.0,
            error_probability: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_supported(&mut self, supported: bool) {
        self.supported = supported;
    }

    /// Permission reported by `query_permission`; `None` emulates a host
    /// without a permission API
    pub fn set_permission(&mut self, permission: Option<PermissionState>) {
        self.permission = permission;
    }

    /// Answer given when a prompt is shown by `request_permission`
    pub fn set_permission_answer(&mut self, answer: PermissionState) {
        self.permission_answer = answer;
    }

    /// Randomly displace each delivered reading by up to `jitter_m` meters
    /// on both axes
    pub fn set_jitter(&mut self, jitter_m: f64) {
        self.jitter_m = jitter_m.max(0.0);
    }

    /// Replace deliveries with timeouts at the given probability (0.0 to 1.0)
    pub fn simulate_errors(&mut self, probability: f64) {
        self.error_probability = probability.clamp(0.0, 1.0);
    }

    /// Active subscriptions in creation order
    pub fn active_subscriptions(&self) -> Vec<(SubscriptionHandle, WatchOptions)> {
        self.subscriptions.iter().map(|(h, o)| (*h, *o)).collect()
    }

    pub fn is_active(&self, handle: SubscriptionHandle) -> bool {
        self.subscriptions.contains_key(&handle)
    }

    /// Number of deliveries waiting for `poll`
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Deliver a reading to every active subscription
    pub fn push_reading(&mut self, timestamp_ms: u64, coordinate: Coordinate) {
        let handles: Vec<SubscriptionHandle> = self.subscriptions.keys().copied().collect();
        for handle in handles {
            self.push_reading_to(handle, timestamp_ms, coordinate);
        }
    }

    /// Deliver a reading to one subscription. Ignored if it is not active.
    pub fn push_reading_to(&mut self, handle: SubscriptionHandle, timestamp_ms: u64, coordinate: Coordinate) {
        let Some(options) = self.subscriptions.get(&handle).copied() else {
            return;
        };

        let payload = if self.should_simulate_error() {
            Err(SourceError::Timeout { timeout_ms: options.timeout_ms })
        } else {
            Ok(Reading {
                timestamp_ms,
                coordinate: self.jittered(coordinate),
            })
        };
        trace!(%handle, ok = payload.is_ok(), "mock delivery queued");
        self.pending.push_back(SourceEvent { handle, payload });
    }

    /// Deliver an error to every active subscription
    pub fn push_error(&mut self, error: SourceError) {
        let handles: Vec<SubscriptionHandle> = self.subscriptions.keys().copied().collect();
        for handle in handles {
            self.push_error_to(handle, error.clone());
        }
    }

    /// Deliver an error to one subscription. Ignored if it is not active.
    pub fn push_error_to(&mut self, handle: SubscriptionHandle, error: SourceError) {
        if self.subscriptions.contains_key(&handle) {
            self.pending.push_back(SourceEvent { handle, payload: Err(error) });
        }
    }

    fn jittered(&mut self, coordinate: Coordinate) -> Coordinate {
        if self.jitter_m <= 0.0 {
            return coordinate;
        }
        let offset = Vector2::new(
            self.rng.gen_range(-self.jitter_m..=self.jitter_m),
            self.rng.gen_range(-self.jitter_m..=self.jitter_m),
        );
        let moved = geodesy::unproject(offset, coordinate.point());
        Coordinate {
            latitude: moved.latitude,
            longitude: moved.longitude,
            ..coordinate
        }
    }

    fn should_simulate_error(&mut self) -> bool {
        self.error_probability > 0.0 && self.rng.gen::<f64>() < self.error_probability
    }
}

impl Default for MockPositionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for MockPositionSource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn watch(&mut self, options: WatchOptions) -> SourceResult<SubscriptionHandle> {
        if !self.supported {
            return Err(SourceError::Unsupported);
        }
        if self.permission == Some(PermissionState::Denied) {
            return Err(SourceError::PermissionDenied);
        }

        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscriptions.insert(handle, options);
        Ok(handle)
    }

    fn cancel(&mut self, handle: SubscriptionHandle) -> bool {
        let removed = self.subscriptions.remove(&handle).is_some();
        if removed {
            self.pending.retain(|event| event.handle != handle);
        }
        removed
    }

    fn poll(&mut self) -> Vec<SourceEvent> {
        self.pending.drain(..).collect()
    }

    fn query_permission(&self) -> Option<PermissionState> {
        self.permission
    }

    fn request_permission(&mut self) -> SourceResult<PermissionState> {
        if !self.supported {
            return Err(SourceError::Unsupported);
        }
        if matches!(self.permission, Some(PermissionState::Prompt) | None) {
            self.permission = Some(self.permission_answer);
        }
        Ok(self.permission.unwrap_or(self.permission_answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Coordinate {
        Coordinate::new(38.7223, -9.1393, 8.0)
    }

    #[test]
    fn test_broadcast_to_all_subscriptions() {
        let mut source = MockPositionSource::new();
        let a = source.watch(WatchOptions::default()).unwrap();
        let b = source.watch(WatchOptions::default()).unwrap();
        assert_ne!(a, b);

        source.push_reading(1000, reading());
        let events = source.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].handle, a);
        assert_eq!(events[1].handle, b);
        assert_eq!(events[0].payload, Ok(Reading { timestamp_ms: 1000, coordinate: reading() }));
        assert!(source.poll().is_empty());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut source = MockPositionSource::new();
        let handle = source.watch(WatchOptions::default()).unwrap();
        source.push_reading(1, reading());

        assert!(source.cancel(handle));
        assert!(!source.cancel(handle));
        assert!(source.poll().is_empty());

        source.push_reading(2, reading());
        assert!(source.poll().is_empty());
    }

    #[test]
    fn test_watch_refused() {
        let mut source = MockPositionSource::new();
        source.set_permission(Some(PermissionState::Denied));
        assert_eq!(source.watch(WatchOptions::default()), Err(SourceError::PermissionDenied));

        source.set_supported(false);
        assert_eq!(source.watch(WatchOptions::default()), Err(SourceError::Unsupported));
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let mut source = MockPositionSource::with_seed(7);
        source.set_jitter(5.0);
        let handle = source.watch(WatchOptions::default()).unwrap();
        for ts in 0..20 {
            source.push_reading_to(handle, ts, reading());
        }
        for event in source.poll() {
            let got = event.payload.unwrap().coordinate;
            let d = geodesy::distance(got.point(), reading().point());
            // Both axes bounded by 5 m
            assert!(d <= 5.0 * 2f64.sqrt() + 1e-6);
            assert_eq!(got.accuracy, 8.0);
        }
    }

    #[test]
    fn test_simulated_errors_are_timeouts() {
        let mut source = MockPositionSource::new();
        source.simulate_errors(1.0);
        let options = WatchOptions { timeout_ms: 2500, ..WatchOptions::default() };
        source.watch(options).unwrap();
        source.push_reading(1, reading());

        let events = source.poll();
        assert_eq!(events[0].payload, Err(SourceError::Timeout { timeout_ms: 2500 }));
    }

    #[test]
    fn test_permission_prompt_answer() {
        let mut source = MockPositionSource::new();
        source.set_permission(Some(PermissionState::Prompt));
        source.set_permission_answer(PermissionState::Denied);
        assert_eq!(source.request_permission(), Ok(PermissionState::Denied));
        assert_eq!(source.query_permission(), Some(PermissionState::Denied));
    }
}
