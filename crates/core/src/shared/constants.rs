use std::time::Duration;

/// How long the worker waits for a frame before giving up.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-iteration wait for a quit key in the render loop.
pub const DISPLAY_WAIT: Duration = Duration::from_millis(50);

/// How long shutdown waits for the worker before detaching it.
pub const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub const WINDOW_TITLE: &str = "webcam";

pub const QUIT_KEY: char = 'q';

/// Face rectangle color (RGB).
pub const FACE_BOX_COLOR: [u8; 3] = [255, 0, 255];

pub const DEFAULT_ENDPOINT: &str = "https://api.neurodatalab.dev";
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const CLIENT_CERT_FILE: &str = "client.crt";
pub const CLIENT_KEY_FILE: &str = "client.key";
pub const CA_CERT_FILE: &str = "ca.crt";
