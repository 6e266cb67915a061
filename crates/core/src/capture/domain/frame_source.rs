use crate::shared::frame::Frame;

/// Produces frames from a capture device, polled synchronously by the
/// render loop.
///
/// `Ok(None)` means the device has no more frames. Errors are treated by
/// the caller as end of stream as well.
pub trait FrameSource {
    fn capture_next(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device handle. Called exactly once at shutdown.
    fn release(&mut self);
}
