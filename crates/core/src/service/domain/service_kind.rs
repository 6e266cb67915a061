use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::pipeline::stream_error::StreamError;
use crate::shared::detection::{BoundingBox, DetectionResult};

/// Names accepted on the command line, canonical name first.
pub const AVAILABLE_SERVICES: &[&str] = &["FaceDetector", "fd"];

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unsupported service '{name}'; only Face Detector is available (one of: {})", AVAILABLE_SERVICES.join(", "))]
pub struct UnsupportedService {
    pub name: String,
}

/// Detection services this client knows how to post-process and draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceKind {
    FaceDetector,
}

impl ServiceKind {
    /// URL path segment for the service.
    pub fn path(&self) -> &'static str {
        match self {
            ServiceKind::FaceDetector => "face-detector",
        }
    }

    /// Applies the service's post-processing to a decoded result.
    pub fn postprocess(&self, result: DetectionResult) -> Result<DetectionResult, StreamError> {
        match self {
            ServiceKind::FaceDetector => postprocess_faces(result),
        }
    }
}

impl FromStr for ServiceKind {
    type Err = UnsupportedService;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "FaceDetector" | "fd" => Ok(ServiceKind::FaceDetector),
            _ => Err(UnsupportedService {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::FaceDetector => write!(f, "FaceDetector"),
        }
    }
}

/// Every face must carry finite `x`, `y`, `w`, `h` with non-negative size.
fn postprocess_faces(result: DetectionResult) -> Result<DetectionResult, StreamError> {
    for (index, faces) in &result {
        for face in faces {
            let bbox = BoundingBox::from_detection(face).map_err(|field| {
                StreamError::Postprocess(format!("face in image {index} is missing '{field}'"))
            })?;
            let values = [bbox.x, bbox.y, bbox.w, bbox.h];
            if values.iter().any(|v| !v.is_finite()) || bbox.w < 0.0 || bbox.h < 0.0 {
                return Err(StreamError::Postprocess(format!(
                    "face in image {index} has invalid box {bbox:?}"
                )));
            }
        }
    }
    Ok(result)
}
