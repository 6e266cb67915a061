use std::thread;
use std::time::{Duration, Instant};

use minifb::{Key, Window, WindowOptions};

use crate::display::domain::display_surface::DisplaySurface;
use crate::shared::constants::QUIT_KEY;
use crate::shared::frame::Frame;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Desktop window backed by minifb.
///
/// The window is created on the first frame so it matches the camera's
/// resolution. Closing it counts as a quit request.
pub struct MinifbWindow {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl MinifbWindow {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            window: None,
            buffer: Vec::new(),
        }
    }

    fn ensure_window(&mut self, width: usize, height: usize) -> Result<&mut Window, minifb::Error> {
        let window = match self.window.take() {
            Some(w) if w.get_size() == (width, height) => w,
            _ => Window::new(&self.title, width, height, WindowOptions::default())?,
        };
        Ok(self.window.insert(window))
    }
}

impl DisplaySurface for MinifbWindow {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let mut buffer = std::mem::take(&mut self.buffer);
        pack_0rgb(frame, &mut buffer);

        let window = self.ensure_window(width, height)?;
        let shown = window.update_with_buffer(&buffer, width, height);
        self.buffer = buffer;
        shown?;
        Ok(())
    }

    fn wait_for_quit(&mut self, timeout: Duration) -> bool {
        let Some(window) = self.window.as_mut() else {
            thread::sleep(timeout);
            return false;
        };
        let deadline = Instant::now() + timeout;
        loop {
            if !window.is_open() || window.is_key_down(quit_key()) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
            window.update();
        }
    }
}

fn quit_key() -> Key {
    match QUIT_KEY {
        'q' => Key::Q,
        _ => Key::Escape,
    }
}

/// Packs RGB (or grayscale) bytes into minifb's `0RGB` u32 layout.
fn pack_0rgb(frame: &Frame, out: &mut Vec<u32>) {
    let channels = frame.channels() as usize;
    out.clear();
    out.extend(frame.data().chunks_exact(channels).map(|px| {
        let (r, g, b) = if channels >= 3 {
            (px[0], px[1], px[2])
        } else {
            (px[0], px[0], px[0])
        };
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }));
}
