use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use geotracker::algorithms::geodesy;
use geotracker::api::{DirectorySink, JsonFormatter, PositionFormatter, TrackingSession};
use geotracker::core::{Coordinate, GeoPoint};
use geotracker::render::CommandRecorder;
use geotracker::source::MockPositionSource;
use geotracker::utils::{init_logging, ConfigurationManager, LogLevel, SettingsUpdate};
use nalgebra::Vector2;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogArg {
    None,
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogArg> for LogLevel {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::None => LogLevel::None,
            LogArg::Error => LogLevel::Error,
            LogArg::Warn => LogLevel::Warn,
            LogArg::Info => LogLevel::Info,
            LogArg::Debug => LogLevel::Debug,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "geotracker")]
#[command(about = "Simulated geolocation tracking session")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated readings
    #[arg(long, default_value_t = 60)]
    steps: u32,

    /// Milliseconds between readings
    #[arg(long)]
    interval: Option<u32>,

    /// Minimum movement (meters) before a position is recorded
    #[arg(long)]
    filter: Option<f64>,

    /// Readings fused per estimate
    #[arg(long)]
    samples: Option<usize>,

    /// Disable the auxiliary triangulation watchers
    #[arg(long)]
    no_triangulation: bool,

    #[arg(long, default_value_t = -23.5505199, allow_hyphen_values = true)]
    start_lat: f64,

    #[arg(long, default_value_t = -46.6333094, allow_hyphen_values = true)]
    start_lon: f64,

    /// Walking speed (m/s)
    #[arg(long, default_value_t = 1.4)]
    speed: f64,

    /// Walking direction (degrees clockwise from north)
    #[arg(long, default_value_t = 45.0)]
    heading: f64,

    /// Reported accuracy of each reading (meters)
    #[arg(long, default_value_t = 8.0)]
    accuracy: f64,

    /// Random displacement applied per watcher (meters)
    #[arg(long, default_value_t = 3.0)]
    jitter: f64,

    /// Probability that a delivery is a timeout instead of a reading
    #[arg(long, default_value_t = 0.0)]
    error_rate: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the CSV export into this directory
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Print the final session snapshot as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogArg,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.into());

    let mut config = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigurationManager::new(),
    };

    let mut update = SettingsUpdate::new();
    if let Some(interval) = args.interval {
        update = update.with_update_interval(interval);
    }
    if let Some(filter) = args.filter {
        update = update.with_position_filter(filter);
    }
    if let Some(samples) = args.samples {
        update = update.with_avg_samples(samples);
    }
    if args.no_triangulation {
        update = update.with_triangulation(false);
    }
    let settings = config.apply_settings(&update).context("applying settings")?;

    let mut source = MockPositionSource::with_seed(args.seed);
    source.set_jitter(args.jitter);
    source.simulate_errors(args.error_rate);

    let start_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let clock = Arc::new(AtomicU64::new(start_ms));
    let session_clock = clock.clone();
    let mut session = TrackingSession::new(source, config)
        .with_clock(Box::new(move || session_clock.load(Ordering::SeqCst)));

    session.check_permissions().context("starting tracking")?;
    info!(watchers = session.watcher_count(), steps = args.steps, "simulation started");

    let origin = GeoPoint::new(args.start_lat, args.start_lon);
    let heading = args.heading.to_radians();
    let step_ms = u64::from(settings.update_interval_ms);
    let step_m = args.speed * step_ms as f64 / 1000.0;
    let mut surface = CommandRecorder::new();
    let mut frames = 0usize;

    for step in 0..args.steps {
        let now = clock.fetch_add(step_ms, Ordering::SeqCst) + step_ms;
        let travelled = step_m * f64::from(step);
        let point = geodesy::unproject(
            Vector2::new(heading.sin() * travelled, heading.cos() * travelled),
            origin,
        );
        let reading = Coordinate::new(point.latitude, point.longitude, args.accuracy)
            .with_speed(args.speed)
            .with_heading(args.heading);

        session.source_mut().push_reading(now, reading);
        session.process();

        if session.render_frame(now, &mut surface) {
            frames += 1;
            surface.take();
        }
    }

    session.stop();

    let stats = session.stats();
    println!("Readings:   {} ({} rejected, {} errors)", stats.readings, stats.rejected, stats.errors);
    println!("Recorded:   {} positions", session.history().len());
    println!("Frames:     {}", frames);

    let formatter = PositionFormatter::local();
    if let Some(current) = session.current_position() {
        let display = formatter.format_position(current);
        println!("Position:   {}, {}", display.latitude, display.longitude);
        println!(
            "Accuracy:   {} m ({:?}, {:.0}%)",
            display.accuracy, display.tier, display.accuracy_percent
        );
        println!("Speed:      {} m/s  Heading: {}", display.speed, display.heading);
    }

    if args.json {
        let json = JsonFormatter::pretty()
            .format_json(&session.snapshot())
            .context("serializing snapshot")?;
        println!("{}", json);
    }

    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut sink = DirectorySink::new(dir);
        let payload = session.export_to(&mut sink).context("exporting history")?;
        println!("Exported:   {}", dir.join(&payload.filename).display());
    }

    Ok(())
}
