use std::time::Duration;

use crate::shared::frame::Frame;

/// A named window the render loop draws into once per iteration.
///
/// Lives on the main thread, so implementations need not be `Send`.
pub trait DisplaySurface {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `timeout` for the user to ask to quit.
    fn wait_for_quit(&mut self, timeout: Duration) -> bool;
}
