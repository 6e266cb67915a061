use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use crate::pipeline::frame_iterator::FrameIterator;
use crate::pipeline::stream_error::{SendError, StreamError};
use crate::service::domain::processing_service::{ProcessingService, ResponseStream, ServiceResponse};
use crate::service::domain::service_kind::ServiceKind;
use crate::service::infrastructure::credentials::{Credentials, CredentialsError};
use crate::shared::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_JPEG_QUALITY, REQUEST_TIMEOUT,
};
use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;

/// Connection settings for [`HttpProcessingService`].
#[derive(Clone, Debug)]
pub struct HttpServiceConfig {
    pub endpoint: String,
    /// Frames uploaded per request.
    pub batch_size: usize,
    pub jpeg_quality: u8,
    pub request_timeout: Duration,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Streams JPEG-encoded frames to the remote service over HTTPS.
///
/// Each request is a multipart form with one `image<N>` part per frame in
/// the batch; the reply is a JSON [`ServiceResponse`] with one payload per
/// part, in order.
pub struct HttpProcessingService {
    kind: ServiceKind,
    client: Client,
    config: HttpServiceConfig,
    frames: Option<FrameIterator>,
}

impl HttpProcessingService {
    /// Builds a client authenticated with the keys directory's certificates.
    pub fn new(
        kind: ServiceKind,
        credentials: &Credentials,
        config: HttpServiceConfig,
    ) -> Result<Self, CredentialsError> {
        let builder = Client::builder().timeout(config.request_timeout);
        let client = credentials
            .apply(builder)?
            .build()
            .map_err(|source| CredentialsError::Tls {
                dir: credentials.dir().to_path_buf(),
                source,
            })?;
        Ok(Self::with_client(kind, client, config))
    }

    pub fn with_client(kind: ServiceKind, client: Client, config: HttpServiceConfig) -> Self {
        Self {
            kind,
            client,
            config,
            frames: None,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/process",
            self.config.endpoint.trim_end_matches('/'),
            self.kind.path()
        )
    }
}

impl ProcessingService for HttpProcessingService {
    fn set_image_source(&mut self, frames: FrameIterator) {
        self.frames = Some(frames);
    }

    fn process_stream(&mut self) -> ResponseStream {
        let Some(frames) = self.frames.take() else {
            let missing: Result<ServiceResponse, StreamError> =
                Err(StreamError::service("no image source registered"));
            return Box::new(std::iter::once(missing));
        };
        log::info!("Streaming frames to {}", self.url());
        Box::new(HttpResponseStream {
            client: self.client.clone(),
            url: self.url(),
            batch_size: self.config.batch_size.max(1),
            jpeg_quality: self.config.jpeg_quality,
            frames,
            done: false,
        })
    }

    fn postprocess(&self, result: DetectionResult) -> Result<DetectionResult, StreamError> {
        self.kind.postprocess(result)
    }
}

struct HttpResponseStream {
    client: Client,
    url: String,
    batch_size: usize,
    jpeg_quality: u8,
    frames: FrameIterator,
    done: bool,
}

impl HttpResponseStream {
    /// Pulls up to `batch_size` frames. An empty batch means the source ended.
    fn next_batch(&mut self) -> Result<Vec<Frame>, StreamError> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.frames.next() {
                Some(frame) => batch.push(frame?),
                None => break,
            }
        }
        Ok(batch)
    }

    fn submit(&self, batch: &[Frame]) -> Result<ServiceResponse, StreamError> {
        let mut form = Form::new();
        for (i, frame) in batch.iter().enumerate() {
            let jpeg = encode_jpeg(frame, self.jpeg_quality).map_err(StreamError::Service)?;
            let part = Part::bytes(jpeg)
                .file_name(format!("frame{}.jpg", frame.index()))
                .mime_str("image/jpeg")
                .map_err(StreamError::service)?;
            form = form.part(format!("image{i}"), part);
        }

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<ServiceResponse>())
            .map_err(StreamError::service)?;

        if response.images.len() != batch.len() {
            log::warn!(
                "Service returned {} results for {} frames",
                response.images.len(),
                batch.len()
            );
        }
        Ok(response)
    }
}

impl Iterator for HttpResponseStream {
    type Item = Result<ServiceResponse, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let outcome = self.next_batch().and_then(|batch| {
            if batch.is_empty() {
                Ok(None)
            } else {
                self.submit(&batch).map(Some)
            }
        });
        match outcome {
            Ok(Some(response)) => Some(Ok(response)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Encodes an RGB or grayscale frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, SendError> {
    let color = match frame.channels() {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        n => return Err(format!("cannot encode {n}-channel frame as JPEG").into()),
    };
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode(
        frame.data(),
        frame.width(),
        frame.height(),
        color,
    )?;
    Ok(buf)
}
