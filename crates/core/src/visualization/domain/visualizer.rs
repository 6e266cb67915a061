use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;

/// Draws a service's results onto a frame, in place.
pub trait Visualizer: Send {
    fn render(
        &self,
        frame: &mut Frame,
        result: &DetectionResult,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
