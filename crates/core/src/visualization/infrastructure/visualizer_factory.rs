use crate::service::domain::service_kind::ServiceKind;
use crate::visualization::domain::visualizer::Visualizer;

use super::face_box_visualizer::FaceBoxVisualizer;

/// Picks the overlay strategy for a service's results.
pub fn create_visualizer(kind: ServiceKind) -> Box<dyn Visualizer> {
    match kind {
        ServiceKind::FaceDetector => Box::new(FaceBoxVisualizer::default()),
    }
}
