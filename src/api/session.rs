//! Tracking session: the context object that owns all tracking state
//!
//! A session wires a [`PositionSource`] to the sample window, refiner, gate,
//! history and viewport. Hosts call [`TrackingSession::process`] regularly to
//! drain the source and [`TrackingSession::render_frame`] from their display
//! loop. Every state change is also reported through event callbacks.

use crate::algorithms::{PositionRefiner, UpdateGate};
use crate::api::export::{CsvExporter, ExportPayload, ExportSink};
use crate::api::formatting::SessionSnapshot;
use crate::api::types::{ApiError, ApiResult, SessionEvent, TrackingStatus};
use crate::core::{RefinedPosition, Sample, SourceTag};
use crate::processing::{HistoryStore, SampleBuffer};
use crate::render::{DrawSurface, FrameScheduler, Renderer, Viewport};
use crate::source::{PermissionState, PositionSource, Reading, SourceError, SubscriptionHandle};
use crate::utils::config::{ConfigurationManager, GeoConfig, SettingsUpdate, TrackerSettings};
use crate::validation::ReadingValidator;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};

/// Callback function type for session events
pub type EventCallback = Box<dyn Fn(SessionEvent) + Send>;

/// Millisecond wall clock used for commit timestamps
pub type Clock = Box<dyn Fn() -> u64 + Send>;

/// Default surface size until the host reports the real one
const DEFAULT_SURFACE: (f64, f64) = (800.0, 600.0);

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u32);

impl CallbackHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Running counters of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub readings: u64,
    pub rejected: u64,
    pub commits: u64,
    pub errors: u64,
}

/// Current wall clock in milliseconds since the epoch
pub fn system_clock() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Geolocation tracking session over a position source
pub struct TrackingSession<S: PositionSource> {
    source: S,
    config: ConfigurationManager,
    buffer: SampleBuffer,
    refiner: PositionRefiner,
    gate: UpdateGate,
    validator: ReadingValidator,
    history: HistoryStore,
    viewport: Viewport,
    renderer: Renderer,
    scheduler: FrameScheduler,
    exporter: CsvExporter,
    /// Active watchers and the tag their readings carry
    subscriptions: BTreeMap<SubscriptionHandle, SourceTag>,
    tracking: bool,
    status: TrackingStatus,
    permission: Option<PermissionState>,
    /// Last position accepted by the gate
    current: Option<RefinedPosition>,
    /// Latest fused estimate, committed or not
    estimate: Option<RefinedPosition>,
    last_error: Option<SourceError>,
    last_update_ms: Option<u64>,
    update_delta_ms: Option<u64>,
    stats: SessionStats,
    callback_counter: u32,
    event_callbacks: HashMap<CallbackHandle, EventCallback>,
    clock: Clock,
}

impl<S: PositionSource> TrackingSession<S> {
    /// Create an idle session using the manager's configuration
    pub fn new(source: S, config: ConfigurationManager) -> Self {
        let settings = config.settings().clone();
        let (width, height) = DEFAULT_SURFACE;
        Self {
            source,
            buffer: SampleBuffer::new(settings.avg_samples),
            refiner: PositionRefiner::new(),
            gate: UpdateGate::new(settings.position_filter_m),
            validator: ReadingValidator::new(),
            history: HistoryStore::new(settings.max_history_items),
            viewport: Viewport::new(width, height, settings.viewport_config()),
            renderer: Renderer::new(),
            scheduler: FrameScheduler::new(settings.canvas_update_rate),
            exporter: CsvExporter::default(),
            config,
            subscriptions: BTreeMap::new(),
            tracking: false,
            status: TrackingStatus::Idle,
            permission: None,
            current: None,
            estimate: None,
            last_error: None,
            last_update_ms: None,
            update_delta_ms: None,
            stats: SessionStats::default(),
            callback_counter: 0,
            event_callbacks: HashMap::new(),
            clock: Box::new(system_clock),
        }
    }

    /// Replace the clock, mainly for simulations and tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the CSV exporter (for a fixed time zone)
    pub fn with_exporter(mut self, exporter: CsvExporter) -> Self {
        self.exporter = exporter;
        self
    }

    // Permission handling

    /// Check support and permission, then start tracking when allowed.
    ///
    /// Hosts without a permission query start directly.
    pub fn check_permissions(&mut self) -> ApiResult<()> {
        if !self.source.is_supported() {
            self.report_error(None, SourceError::Unsupported);
            return Err(SourceError::Unsupported.into());
        }

        match self.source.query_permission() {
            Some(state) => self.on_permission_change(state),
            None => {
                warn!("permission query not available, starting directly");
                self.start()
            }
        }
    }

    /// React to a new permission state reported by the host
    pub fn on_permission_change(&mut self, state: PermissionState) -> ApiResult<()> {
        self.permission = Some(state);
        self.trigger_event(SessionEvent::PermissionChanged { state });

        match state {
            PermissionState::Granted => {
                if self.tracking {
                    Ok(())
                } else {
                    self.start()
                }
            }
            PermissionState::Prompt => {
                info!("location permission must be requested");
                self.trigger_event(SessionEvent::PermissionRequired);
                Ok(())
            }
            PermissionState::Denied => {
                self.report_error(None, SourceError::PermissionDenied);
                Err(SourceError::PermissionDenied.into())
            }
        }
    }

    /// Ask the host for permission and act on the answer
    pub fn request_permission(&mut self) -> ApiResult<PermissionState> {
        match self.source.request_permission() {
            Ok(state) => {
                self.on_permission_change(state)?;
                Ok(state)
            }
            Err(error) => {
                self.report_error(None, error.clone());
                Err(error.into())
            }
        }
    }

    // Tracking lifecycle

    /// Start the primary watcher and, when enabled, the triangulation
    /// watchers. Restarts if already tracking.
    pub fn start(&mut self) -> ApiResult<()> {
        self.cancel_watchers();
        self.set_status(TrackingStatus::Connecting);

        let geo = self.config.geolocation().clone();
        match self.source.watch(geo.watch_options()) {
            Ok(handle) => {
                self.subscriptions.insert(handle, SourceTag::Primary);
            }
            Err(error) => {
                self.report_error(None, error.clone());
                return Err(error.into());
            }
        }

        if self.config.settings().enable_triangulation {
            self.start_triangulation(&geo);
        }

        self.tracking = true;
        self.set_status(TrackingStatus::Online);
        info!(watchers = self.subscriptions.len(), "tracking started");
        self.trigger_event(SessionEvent::TrackingStarted {
            watchers: self.subscriptions.len(),
        });
        Ok(())
    }

    fn start_triangulation(&mut self, geo: &GeoConfig) {
        for index in 0..geo.triangulation_watchers {
            let tag = SourceTag::Triangulation(index);
            match self.source.watch(geo.triangulation_options(index)) {
                Ok(handle) => {
                    self.subscriptions.insert(handle, tag);
                }
                Err(error) => warn!(watcher = %tag, %error, "triangulation watcher not started"),
            }
        }
    }

    /// Cancel every watcher. Returns false if the session was not tracking.
    pub fn stop(&mut self) -> bool {
        let was_tracking = self.tracking;
        self.cancel_watchers();
        self.tracking = false;
        self.set_status(TrackingStatus::Idle);
        if was_tracking {
            info!("tracking stopped");
            self.trigger_event(SessionEvent::TrackingStopped);
        }
        was_tracking
    }

    fn cancel_watchers(&mut self) {
        let handles: Vec<SubscriptionHandle> = self.subscriptions.keys().copied().collect();
        for handle in handles {
            if !self.source.cancel(handle) {
                debug!(%handle, "watcher already cancelled");
            }
        }
        self.subscriptions.clear();
    }

    // Position processing

    /// Drain the source and apply every delivery. Returns the number of
    /// deliveries handled.
    pub fn process(&mut self) -> usize {
        let events = self.source.poll();
        let mut handled = 0;

        for event in events {
            let Some(tag) = self.subscriptions.get(&event.handle).copied() else {
                debug!(handle = %event.handle, "delivery for inactive watcher dropped");
                continue;
            };
            match event.payload {
                Ok(reading) => self.handle_reading(tag, reading),
                Err(error) => self.handle_error(tag, error),
            }
            handled += 1;
        }
        handled
    }

    fn handle_reading(&mut self, tag: SourceTag, reading: Reading) {
        self.stats.readings += 1;
        if let Err(error) = self.validator.validate(&reading) {
            self.stats.rejected += 1;
            warn!(source = %tag, %error, "reading rejected");
            self.trigger_event(SessionEvent::ReadingRejected { source: tag, error });
            return;
        }

        self.buffer.push(Sample::new(tag, reading.timestamp_ms, reading.coordinate));
        let Some(coordinate) = self.refiner.refine(&self.buffer) else {
            return;
        };

        let now = (self.clock)();
        let estimate = RefinedPosition { timestamp_ms: now, coordinate };
        self.estimate = Some(estimate);
        self.trigger_event(SessionEvent::EstimateUpdated { source: tag, estimate });

        // Auxiliary readings only feed the window; the next primary fix commits
        if tag != SourceTag::Primary {
            return;
        }

        self.update_delta_ms = self.last_update_ms.map(|last| now.saturating_sub(last));
        self.last_update_ms = Some(now);

        let last = self.current.as_ref().map(|p| &p.coordinate);
        if self.gate.should_commit(&coordinate, last) {
            self.commit(estimate);
        } else {
            debug!(filter_m = self.gate.filter_m, "estimate below movement filter");
        }

        self.set_status(TrackingStatus::Online);
    }

    fn commit(&mut self, position: RefinedPosition) {
        self.current = Some(position);
        let id = self.history.append(position);
        self.stats.commits += 1;
        debug!(
            id = id.0,
            latitude = position.coordinate.latitude,
            longitude = position.coordinate.longitude,
            accuracy = position.coordinate.accuracy,
            "position committed"
        );
        self.trigger_event(SessionEvent::PositionCommitted { id, position });

        if self.viewport.reference_center().is_none() {
            let center = position.coordinate.point();
            self.viewport.set_reference_center(center);
            info!(latitude = center.latitude, longitude = center.longitude, "map centered");
            self.trigger_event(SessionEvent::ReferenceCenterSet { center });
        }
    }

    fn handle_error(&mut self, tag: SourceTag, error: SourceError) {
        if let SourceTag::Triangulation(_) = tag {
            warn!(watcher = %tag, %error, "triangulation watcher error ignored");
            return;
        }
        self.report_error(Some(tag), error);
    }

    /// Surface an error. Terminal errors end tracking; others leave the
    /// watchers running so the source can recover.
    fn report_error(&mut self, source: Option<SourceTag>, error: SourceError) {
        self.stats.errors += 1;
        if error.is_terminal() {
            error!(%error, "tracking stopped by source error");
            self.cancel_watchers();
            self.tracking = false;
        } else {
            warn!(%error, "position source error");
        }

        self.last_error = Some(error.clone());
        self.set_status(TrackingStatus::Offline);
        let guidance = error.guidance().iter().map(|s| s.to_string()).collect();
        self.trigger_event(SessionEvent::SourceFailed { source, error, guidance });
    }

    fn set_status(&mut self, new_status: TrackingStatus) {
        let old_status = self.status;
        if old_status != new_status {
            self.status = new_status;
            debug!(%old_status, %new_status, "status changed");
            self.trigger_event(SessionEvent::StatusChanged { old_status, new_status });
        }
    }

    // Settings

    /// Apply a settings change and restart the watchers if tracking
    pub fn apply_settings(&mut self, update: &SettingsUpdate) -> ApiResult<TrackerSettings> {
        let settings = self.config.apply_settings(update)?;
        self.settings_changed(settings.clone())?;
        Ok(settings)
    }

    /// Restore default settings and restart the watchers if tracking
    pub fn reset_settings(&mut self) -> ApiResult<TrackerSettings> {
        let settings = self.config.reset_settings();
        self.settings_changed(settings.clone())?;
        Ok(settings)
    }

    fn settings_changed(&mut self, settings: TrackerSettings) -> ApiResult<()> {
        self.buffer.set_capacity(settings.avg_samples);
        self.history.set_capacity(settings.max_history_items);
        self.gate = UpdateGate::new(settings.position_filter_m);
        self.viewport.set_config(settings.viewport_config());
        self.scheduler.set_fps(settings.canvas_update_rate);
        info!(?settings, "settings applied");
        self.trigger_event(SessionEvent::SettingsApplied { settings });

        if self.tracking {
            self.start()?;
        }
        Ok(())
    }

    pub fn settings(&self) -> &TrackerSettings {
        self.config.settings()
    }

    pub fn configuration(&self) -> &ConfigurationManager {
        &self.config
    }

    // History and export

    /// Drop every history entry. The current position and map center stay.
    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("history cleared");
        self.trigger_event(SessionEvent::HistoryCleared);
    }

    /// Build the CSV export of the history
    pub fn export(&self) -> ApiResult<ExportPayload> {
        Ok(self.exporter.export(&self.history, (self.clock)())?)
    }

    /// Build the CSV export and hand it to a sink
    pub fn export_to(&self, sink: &mut dyn ExportSink) -> ApiResult<ExportPayload> {
        let payload = self.export()?;
        sink.deliver(&payload)?;
        Ok(payload)
    }

    // Viewport

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.viewport.begin_drag(x, y);
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        self.viewport.drag_to(x, y);
    }

    pub fn end_drag(&mut self) {
        self.viewport.end_drag();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.viewport.wheel(delta_y);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    /// Forget the map center; the next committed position becomes the new one
    pub fn recenter(&mut self) {
        self.viewport.clear_reference_center();
    }

    // Rendering

    /// Draw the map unconditionally
    pub fn render(&self, surface: &mut dyn DrawSurface) {
        self.renderer
            .render(surface, &self.viewport, &self.history, self.current.as_ref());
    }

    /// Draw the map if the frame rate allows it at `now_ms`
    pub fn render_frame(&mut self, now_ms: u64, surface: &mut dyn DrawSurface) -> bool {
        if !self.scheduler.tick(now_ms) {
            return false;
        }
        self.render(surface);
        true
    }

    // Callbacks

    /// Register an event callback
    pub fn register_event_callback(&mut self, callback: EventCallback) -> CallbackHandle {
        self.callback_counter += 1;
        let handle = CallbackHandle(self.callback_counter);
        self.event_callbacks.insert(handle, callback);
        handle
    }

    /// Unregister a callback
    pub fn unregister_callback(&mut self, handle: CallbackHandle) -> ApiResult<()> {
        match self.event_callbacks.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(ApiError::InvalidRequest {
                reason: "Invalid callback handle".to_string(),
            }),
        }
    }

    pub fn callback_count(&self) -> usize {
        self.event_callbacks.len()
    }

    fn trigger_event(&self, event: SessionEvent) {
        for callback in self.event_callbacks.values() {
            callback(event.clone());
        }
    }

    // Accessors

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn permission(&self) -> Option<PermissionState> {
        self.permission
    }

    /// Last position accepted into the history
    pub fn current_position(&self) -> Option<&RefinedPosition> {
        self.current.as_ref()
    }

    /// Latest fused estimate, including ones the gate held back
    pub fn estimate(&self) -> Option<&RefinedPosition> {
        self.estimate.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn sample_buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn last_error(&self) -> Option<&SourceError> {
        self.last_error.as_ref()
    }

    /// Time between the two most recent accepted readings
    pub fn update_delta_ms(&self) -> Option<u64> {
        self.update_delta_ms
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Number of active watchers
    pub fn watcher_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Serializable view of the session state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            tracking: self.tracking,
            watchers: self.subscriptions.len(),
            current: self.current,
            history_len: self.history.len(),
            zoom: self.viewport.zoom(),
            reference_center: self.viewport.reference_center(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
            update_delta_ms: self.update_delta_ms,
        }
    }
}
