use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

/// libavdevice input format used to open cameras on this platform.
#[cfg(target_os = "linux")]
pub const CAMERA_INPUT_FORMAT: &str = "video4linux2";
#[cfg(target_os = "macos")]
pub const CAMERA_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
pub const CAMERA_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const CAMERA_INPUT_FORMAT: &str = "video4linux2";

/// Default device name for the first camera.
#[cfg(target_os = "macos")]
pub const DEFAULT_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Captures webcam frames through ffmpeg-next (libavdevice + libavcodec).
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegCamera {
    stream: Option<CameraStream>,
    frame_index: usize,
}

struct CameraStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

impl FfmpegCamera {
    /// Opens `device` with the platform's capture input format.
    pub fn open(device: &str) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = find_input_format(CAMERA_INPUT_FORMAT)
            .ok_or_else(|| format!("Capture input format '{CAMERA_INPUT_FORMAT}' not available"))?;

        let ictx = ffmpeg_next::format::open_with(&device, &format, ffmpeg_next::Dictionary::new())?
            .input();

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No video stream on capture device {device}"))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!("Opened capture device {device} ({width}x{height})");

        Ok(Self {
            stream: Some(CameraStream {
                ictx,
                decoder,
                scaler,
                stream_index,
                width,
                height,
            }),
            frame_index: 0,
        })
    }
}

impl CameraStream {
    fn try_receive(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, 3, index)))
    }

    fn next_frame(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if let Some(frame) = self.try_receive(index)? {
            return Ok(Some(frame));
        }
        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                return Ok(None);
            };
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;
            if let Some(frame) = self.try_receive(index)? {
                return Ok(Some(frame));
            }
        }
    }
}

impl FrameSource for FfmpegCamera {
    fn capture_next(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err("FfmpegCamera: device already released".into());
        };
        let frame = stream.next_frame(self.frame_index)?;
        if frame.is_some() {
            self.frame_index += 1;
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Webcam capture released");
        }
    }
}

/// Copies RGB rows out of a possibly padded ffmpeg plane.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    copy_rows(rgb_frame.data(0), rgb_frame.stride(0), width as usize * 3, height as usize)
}

fn copy_rows(plane: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * stride;
        pixels.extend_from_slice(&plane[start..start + row_bytes]);
    }
    pixels
}

/// Looks up a registered libavdevice video input by name.
fn find_input_format(name: &str) -> Option<ffmpeg_next::Format> {
    ffmpeg_next::device::input::video().find(|f| f.name() == name)
}
