use serde::{Deserialize, Serialize};

use crate::pipeline::frame_iterator::FrameIterator;
use crate::pipeline::stream_error::StreamError;
use crate::shared::detection::{DetectionRecord, DetectionResult};

/// Raw per-image output: the service's JSON payload, still encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub result: String,
}

/// One reply from the remote service, covering a batch of submitted frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub images: Vec<ImageResult>,
}

/// Lazy sequence of responses, pulled by the response collector.
pub type ResponseStream = Box<dyn Iterator<Item = Result<ServiceResponse, StreamError>> + Send>;

/// Remote detection service the pipeline streams frames into.
///
/// The service owns the frame source once registered and decides how many
/// frames go into each request. Detection itself is opaque to the pipeline.
pub trait ProcessingService: Send {
    /// Registers the frame sequence the service pulls images from.
    fn set_image_source(&mut self, frames: FrameIterator);

    /// Starts streaming. Ends when the image source ends or fails.
    fn process_stream(&mut self) -> ResponseStream;

    /// Service-specific transform from decoded payloads to application results.
    fn postprocess(&self, result: DetectionResult) -> Result<DetectionResult, StreamError>;

    /// Decodes each image payload, keyed by its position in the batch.
    fn decode(&self, response: &ServiceResponse) -> Result<DetectionResult, StreamError> {
        response
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                serde_json::from_str::<DetectionRecord>(&image.result)
                    .map(|record| (index, record))
                    .map_err(|source| StreamError::Decode { index, source })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct DecodeOnly;

    impl ProcessingService for DecodeOnly {
        fn set_image_source(&mut self, _frames: FrameIterator) {}

        fn process_stream(&mut self) -> ResponseStream {
            Box::new(std::iter::empty::<Result<ServiceResponse, StreamError>>())
        }

        fn postprocess(&self, result: DetectionResult) -> Result<DetectionResult, StreamError> {
            Ok(result)
        }
    }

    fn response(payloads: &[&str]) -> ServiceResponse {
        ServiceResponse {
            images: payloads
                .iter()
                .map(|p| ImageResult {
                    result: p.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_decode_keys_results_by_batch_position() {
        let decoded = DecodeOnly
            .decode(&response(&[
                r#"[{"x": 10, "y": 12.5, "w": 5, "h": 5}]"#,
                "[]",
            ]))
            .unwrap();

        assert_eq!(decoded.len(), 2);
        let face = &decoded[&0][0];
        assert_relative_eq!(face["x"], 10.0);
        assert_relative_eq!(face["y"], 12.5);
        assert!(decoded[&1].is_empty());
    }

    #[test]
    fn test_decode_empty_response_is_empty_result() {
        assert!(DecodeOnly.decode(&ServiceResponse::default()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_reports_failing_image_index() {
        let err = DecodeOnly
            .decode(&response(&["[]", "{not json"]))
            .unwrap_err();
        assert!(matches!(err, StreamError::Decode { index: 1, .. }));
    }

    #[test]
    fn test_decode_rejects_non_numeric_fields() {
        let err = DecodeOnly
            .decode(&response(&[r#"[{"x": "ten"}]"#]))
            .unwrap_err();
        assert!(matches!(err, StreamError::Decode { index: 0, .. }));
    }

    #[test]
    fn test_response_wire_format() {
        let parsed: ServiceResponse =
            serde_json::from_str(r#"{"images":[{"result":"[]"}]}"#).unwrap();
        assert_eq!(parsed, response(&["[]"]));
    }
}
