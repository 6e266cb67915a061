use crossbeam_channel::Sender;

use crate::pipeline::stream_error::StreamError;
use crate::service::domain::processing_service::ProcessingService;
use crate::shared::detection::DetectionResult;
use crate::shared::stop_signal::StopSignal;

/// Worker-side consumer of the service's response stream.
///
/// Decodes and post-processes every response, forwards it to the render
/// loop over the unbounded outbound queue, and sets the stop signal when it
/// exits, whichever way that happens.
pub struct ResponseCollector {
    results_tx: Sender<DetectionResult>,
    stop: StopSignal,
}

impl ResponseCollector {
    pub fn new(results_tx: Sender<DetectionResult>, stop: StopSignal) -> Self {
        Self { results_tx, stop }
    }

    /// Drains the service's responses. Returns how many results were forwarded.
    pub fn run(&self, service: &mut dyn ProcessingService) -> Result<usize, StreamError> {
        let _stop_on_exit = self.stop.set_on_drop();
        let outcome = self.collect(service);
        match &outcome {
            Ok(count) => log::info!("Response stream finished after {count} results"),
            Err(e) => log::error!("Exception while iterating API response: {e}"),
        }
        outcome
    }

    fn collect(&self, service: &mut dyn ProcessingService) -> Result<usize, StreamError> {
        let mut forwarded = 0;
        for response in service.process_stream() {
            let decoded = service.decode(&response?)?;
            let result = service.postprocess(decoded)?;

            if self.results_tx.send(result).is_err() {
                log::debug!("Outbound queue closed; render loop is gone");
                break;
            }
            forwarded += 1;

            if self.stop.is_set() {
                break;
            }
        }
        Ok(forwarded)
    }
}
