use std::time::Duration;

use thiserror::Error;

/// Boxed error that can cross the worker thread boundary.
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that end a streaming session. None of them are retried.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("webcam timeout exceeded: no frame within {0:?}")]
    Timeout(Duration),
    #[error("failed to decode result for image {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to postprocess result: {0}")]
    Postprocess(String),
    #[error("remote service failed: {0}")]
    Service(#[source] SendError),
    #[error("failed to draw result: {0}")]
    Render(String),
    #[error("display failed: {0}")]
    Display(String),
    #[error("worker thread panicked")]
    WorkerPanicked,
}

impl StreamError {
    pub fn service(err: impl Into<SendError>) -> Self {
        Self::Service(err.into())
    }
}
