use std::thread;
use std::time::Duration;

use crate::display::domain::display_surface::DisplaySurface;
use crate::shared::frame::Frame;

/// Display surface for machines without a screen: logs instead of drawing.
///
/// Never requests a quit; the pipeline stops on end of stream or when the
/// worker sets the stop signal.
#[derive(Default)]
pub struct HeadlessDisplay {
    shown: usize,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> usize {
        self.shown
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.shown += 1;
        log::debug!(
            "Frame {} ({}x{}) rendered headless",
            frame.index(),
            frame.width(),
            frame.height()
        );
        Ok(())
    }

    fn wait_for_quit(&mut self, timeout: Duration) -> bool {
        thread::sleep(timeout);
        false
    }
}
