use crate::render::ViewportConfig;
use crate::source::WatchOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Smallest accepted interval between position updates (milliseconds)
pub const MIN_UPDATE_INTERVAL_MS: u32 = 500;

/// Verbosity of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Options passed to the position source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Request the provider's most precise mode
    pub high_accuracy: bool,
    /// Primary watcher timeout (milliseconds)
    pub timeout_ms: u32,
    /// Primary watcher cache age (milliseconds)
    pub max_cache_age_ms: u32,
    /// Number of extra watchers started when triangulation is enabled
    pub triangulation_watchers: u8,
    /// Timeout added per triangulation watcher index (milliseconds)
    pub triangulation_timeout_step_ms: u32,
    /// Cache age per triangulation watcher index (milliseconds)
    pub triangulation_cache_step_ms: u32,
}

impl Default for GeoConfig {
    fn default() -> Self {
        let watch = WatchOptions::default();
        Self {
            high_accuracy: watch.high_accuracy,
            timeout_ms: watch.timeout_ms,
            max_cache_age_ms: watch.max_cache_age_ms,
            triangulation_watchers: 3,
            triangulation_timeout_step_ms: 1000,
            triangulation_cache_step_ms: 500,
        }
    }
}

impl GeoConfig {
    /// Options of the primary watcher
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            max_cache_age_ms: self.max_cache_age_ms,
        }
    }

    /// Options of triangulation watcher `index`
    pub fn triangulation_options(&self, index: u8) -> WatchOptions {
        self.watch_options().for_triangulation(
            index,
            self.triangulation_timeout_step_ms,
            self.triangulation_cache_step_ms,
        )
    }
}

/// User-adjustable tracking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Interval between position updates (milliseconds)
    pub update_interval_ms: u32,
    /// Minimum movement to record a new position (meters); 0 disables
    pub position_filter_m: f64,
    /// Size of the sample window used for fusion
    pub avg_samples: usize,
    /// Start the additional triangulation watchers
    pub enable_triangulation: bool,
    /// Maximum number of history entries
    pub max_history_items: usize,
    /// Map redraw rate (frames per second)
    pub canvas_update_rate: u32,
    /// Zoom step multiplier
    pub zoom_factor: f64,
    pub max_zoom: f64,
    pub min_zoom: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000,
            position_filter_m: 0.0,
            avg_samples: 5,
            enable_triangulation: true,
            max_history_items: 100,
            canvas_update_rate: 30,
            zoom_factor: 1.5,
            max_zoom: 25.0,
            min_zoom: 0.5,
        }
    }
}

impl TrackerSettings {
    /// Viewport limits derived from these settings
    pub fn viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            zoom_factor: self.zoom_factor,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            ..ViewportConfig::default()
        }
    }
}

/// Complete tracker configuration as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub geolocation: GeoConfig,
    pub settings: TrackerSettings,
    pub log_level: LogLevel,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            geolocation: GeoConfig::default(),
            settings: TrackerSettings::default(),
            log_level: LogLevel::Info,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::IoError { message } => write!(f, "I/O error: {}", message),
            ConfigError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Outcome of a configuration check
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

/// Partial settings change applied with [`ConfigurationManager::apply_settings`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub update_interval_ms: Option<u32>,
    pub position_filter_m: Option<f64>,
    pub avg_samples: Option<usize>,
    pub enable_triangulation: Option<bool>,
    pub max_history_items: Option<usize>,
    pub canvas_update_rate: Option<u32>,
}

impl SettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update_interval(mut self, interval_ms: u32) -> Self {
        self.update_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_position_filter(mut self, filter_m: f64) -> Self {
        self.position_filter_m = Some(filter_m);
        self
    }

    pub fn with_avg_samples(mut self, samples: usize) -> Self {
        self.avg_samples = Some(samples);
        self
    }

    pub fn with_triangulation(mut self, enabled: bool) -> Self {
        self.enable_triangulation = Some(enabled);
        self
    }

    pub fn with_max_history_items(mut self, items: usize) -> Self {
        self.max_history_items = Some(items);
        self
    }

    pub fn with_canvas_update_rate(mut self, fps: u32) -> Self {
        self.canvas_update_rate = Some(fps);
        self
    }

    /// Number of settings this update touches
    pub fn count_updates(&self) -> usize {
        [
            self.update_interval_ms.is_some(),
            self.position_filter_m.is_some(),
            self.avg_samples.is_some(),
            self.enable_triangulation.is_some(),
            self.max_history_items.is_some(),
            self.canvas_update_rate.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// Owns the tracker configuration and its file
pub struct ConfigurationManager {
    config: TrackerConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a manager holding the default configuration
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create a manager and load the configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.config.settings
    }

    pub fn geolocation(&self) -> &GeoConfig {
        &self.config.geolocation
    }

    /// Replace the whole configuration after validating it
    pub fn set_config(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        Self::first_error(self.validate_config(&config))?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: TrackerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        Self::first_error(self.validate_config(&config))?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the file the configuration was last loaded from or saved to
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last load or save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Validate a configuration without applying it
    pub fn validate_config(&self, config: &TrackerConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let settings = &config.settings;

        if settings.update_interval_ms < MIN_UPDATE_INTERVAL_MS {
            errors.push(invalid(
                "update_interval_ms",
                settings.update_interval_ms,
                "Update interval must be at least 500 ms",
            ));
        }

        if settings.avg_samples == 0 {
            errors.push(invalid("avg_samples", settings.avg_samples, "At least one sample is required"));
        } else if settings.avg_samples > 50 {
            warnings.push("Large sample window will make the position lag behind movement".to_string());
        }

        if settings.position_filter_m.is_nan() {
            errors.push(invalid(
                "position_filter_m",
                settings.position_filter_m,
                "Position filter must be a number",
            ));
        } else if settings.position_filter_m < 0.0 {
            warnings.push("Negative position filter disables filtering".to_string());
        }

        if settings.max_history_items == 0 {
            errors.push(invalid(
                "max_history_items",
                settings.max_history_items,
                "History must hold at least one entry",
            ));
        }

        if settings.canvas_update_rate == 0 {
            errors.push(invalid(
                "canvas_update_rate",
                settings.canvas_update_rate,
                "Frame rate must be positive",
            ));
        } else if settings.canvas_update_rate > 120 {
            warnings.push("Frame rates above 120 fps are rarely displayed".to_string());
        }

        if !(settings.zoom_factor > 1.0) {
            errors.push(invalid("zoom_factor", settings.zoom_factor, "Zoom factor must be greater than 1"));
        }

        if !(settings.min_zoom > 0.0 && settings.min_zoom <= settings.max_zoom) {
            errors.push(invalid(
                "min_zoom",
                settings.min_zoom,
                "Minimum zoom must be positive and not above the maximum zoom",
            ));
        }

        if config.geolocation.timeout_ms == 0 {
            errors.push(invalid(
                "timeout_ms",
                config.geolocation.timeout_ms,
                "Watch timeout must be positive",
            ));
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Apply a partial settings change.
    ///
    /// The update interval is raised to at least 500 ms and the sample count
    /// to at least 1 rather than rejected. Returns the settings now in effect.
    pub fn apply_settings(&mut self, update: &SettingsUpdate) -> Result<TrackerSettings, ConfigError> {
        let mut settings = self.config.settings.clone();

        if let Some(interval) = update.update_interval_ms {
            settings.update_interval_ms = interval.max(MIN_UPDATE_INTERVAL_MS);
        }
        if let Some(filter) = update.position_filter_m {
            settings.position_filter_m = filter;
        }
        if let Some(samples) = update.avg_samples {
            settings.avg_samples = samples.max(1);
        }
        if let Some(enabled) = update.enable_triangulation {
            settings.enable_triangulation = enabled;
        }
        if let Some(items) = update.max_history_items {
            settings.max_history_items = items;
        }
        if let Some(fps) = update.canvas_update_rate {
            settings.canvas_update_rate = fps;
        }

        let candidate = TrackerConfig {
            settings: settings.clone(),
            ..self.config.clone()
        };
        Self::first_error(self.validate_config(&candidate))?;

        if settings != self.config.settings {
            self.config.settings = settings.clone();
            self.is_modified = true;
        }
        Ok(settings)
    }

    /// Restore default settings, keeping geolocation options and log level
    pub fn reset_settings(&mut self) -> TrackerSettings {
        let old = std::mem::take(&mut self.config.settings);
        if old != self.config.settings {
            self.is_modified = true;
        }
        self.config.settings.clone()
    }

    /// Change the log level; returns the old one
    pub fn set_log_level(&mut self, level: LogLevel) -> LogLevel {
        let old = self.config.log_level;
        self.config.log_level = level;
        self.is_modified |= old != level;
        old
    }

    fn first_error(validation: ValidationResult) -> Result<(), ConfigError> {
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn invalid<V: ToString>(parameter: &str, value: V, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
