use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use facestream_core::capture::infrastructure::ffmpeg_camera::{FfmpegCamera, DEFAULT_DEVICE};
use facestream_core::display::domain::display_surface::DisplaySurface;
use facestream_core::display::infrastructure::headless_display::HeadlessDisplay;
use facestream_core::display::infrastructure::minifb_window::MinifbWindow;
use facestream_core::pipeline::stream_logger::LogStreamLogger;
use facestream_core::pipeline::streaming_pipeline::{StreamConfig, StreamingPipeline};
use facestream_core::service::domain::service_kind::{ServiceKind, AVAILABLE_SERVICES};
use facestream_core::service::infrastructure::credentials::Credentials;
use facestream_core::service::infrastructure::http_service::{
    HttpProcessingService, HttpServiceConfig,
};
use facestream_core::shared::constants::{DEFAULT_ENDPOINT, QUIT_KEY};
use facestream_core::visualization::infrastructure::visualizer_factory::create_visualizer;

/// Live webcam face detection through a remote service.
#[derive(Parser)]
#[command(name = "facestream")]
struct Cli {
    /// Folder with the client keys downloaded from the service (client.crt, client.key, ca.crt).
    #[arg(long)]
    keys_path: PathBuf,

    /// Service to process video. Available services: FaceDetector, fd.
    #[arg(long)]
    service: String,

    /// Base URL of the processing service.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Capture device to open.
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Seconds the worker waits for a frame before aborting.
    #[arg(long, default_value = "5")]
    frame_timeout: f64,

    /// Frames uploaded per request.
    #[arg(long, default_value = "1")]
    batch_size: usize,

    /// Run without a window (results are only logged).
    #[arg(long)]
    headless: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let kind: ServiceKind = cli.service.parse()?;
    let credentials = Credentials::load(&cli.keys_path)?;
    let service = HttpProcessingService::new(
        kind,
        &credentials,
        HttpServiceConfig {
            endpoint: cli.endpoint.clone(),
            batch_size: cli.batch_size,
            ..HttpServiceConfig::default()
        },
    )?;
    log::info!("Using service {kind} at {}", service.url());

    let config = StreamConfig {
        frame_timeout: frame_timeout(&cli)?,
        ..StreamConfig::default()
    };
    let mut display: Box<dyn DisplaySurface> = if cli.headless {
        Box::new(HeadlessDisplay::new())
    } else {
        Box::new(MinifbWindow::new(&config.window_title))
    };
    let mut camera = FfmpegCamera::open(&cli.device)?;
    let mut logger = LogStreamLogger::new();

    if !cli.headless {
        log::info!("Press '{QUIT_KEY}' in the window to stop");
    }

    let pipeline = StreamingPipeline::new(
        config,
        Box::new(service),
        create_visualizer(kind),
    );
    let report = pipeline.start_streaming(&mut camera, display.as_mut(), &mut logger)?;

    log::info!(
        "Stream ended ({:?}): {} frames shown, {} results",
        report.render.exit,
        report.render.frames_rendered,
        report.render.results_received
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !AVAILABLE_SERVICES.contains(&cli.service.as_str()) {
        return Err(format!(
            "Only Face Detector service is available, got '{}' (expected one of: {})",
            cli.service,
            AVAILABLE_SERVICES.join(", ")
        )
        .into());
    }
    if !cli.keys_path.is_dir() {
        return Err(format!("Keys folder not found: {}", cli.keys_path.display()).into());
    }
    frame_timeout(cli)?;
    if cli.batch_size == 0 {
        return Err("Batch size must be at least 1".into());
    }
    Ok(())
}

fn frame_timeout(cli: &Cli) -> Result<Duration, Box<dyn std::error::Error>> {
    match Duration::try_from_secs_f64(cli.frame_timeout) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(format!(
            "Frame timeout must be a positive number of seconds, got {}",
            cli.frame_timeout
        )
        .into()),
    }
}
