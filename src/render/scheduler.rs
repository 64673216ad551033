//! Frame pacing

/// Decides whether a display tick should produce a frame.
///
/// Ticks arriving sooner than `1000 / fps` ms after the last rendered frame
/// are skipped, never delayed.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    min_interval_ms: f64,
    last_render_ms: Option<u64>,
}

impl FrameScheduler {
    pub fn new(fps: u32) -> Self {
        Self {
            min_interval_ms: Self::interval_for(fps),
            last_render_ms: None,
        }
    }

    pub fn min_interval_ms(&self) -> f64 {
        self.min_interval_ms
    }

    /// Change the target rate without losing the last frame time
    pub fn set_fps(&mut self, fps: u32) {
        self.min_interval_ms = Self::interval_for(fps);
    }

    /// Returns true when a frame should be rendered at `now_ms`
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let due = match self.last_render_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) as f64 >= self.min_interval_ms,
        };
        if due {
            self.last_render_ms = Some(now_ms);
        }
        due
    }

    /// Forget the last frame so the next tick always renders
    pub fn reset(&mut self) {
        self.last_render_ms = None;
    }

    fn interval_for(fps: u32) -> f64 {
        1000.0 / f64::from(fps.max(1))
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(30)
    }
}
