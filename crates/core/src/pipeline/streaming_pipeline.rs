use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::capture::domain::frame_source::FrameSource;
use crate::display::domain::display_surface::DisplaySurface;
use crate::pipeline::frame_feeder::FrameFeeder;
use crate::pipeline::frame_iterator::FrameIterator;
use crate::pipeline::render_loop::{RenderLoop, RenderReport};
use crate::pipeline::response_collector::ResponseCollector;
use crate::pipeline::stream_error::StreamError;
use crate::pipeline::stream_logger::StreamLogger;
use crate::service::domain::processing_service::ProcessingService;
use crate::shared::constants::{DISPLAY_WAIT, FRAME_TIMEOUT, WINDOW_TITLE, WORKER_SHUTDOWN_GRACE};
use crate::shared::stop_signal::StopSignal;
use crate::visualization::domain::visualizer::Visualizer;

/// Timing knobs for a streaming session.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Worker gives up if no frame arrives within this window.
    pub frame_timeout: Duration,
    /// Per-frame wait for the quit key.
    pub display_wait: Duration,
    pub window_title: String,
    /// How long shutdown waits for the worker before detaching it.
    pub worker_shutdown_grace: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_timeout: FRAME_TIMEOUT,
            display_wait: DISPLAY_WAIT,
            window_title: WINDOW_TITLE.to_string(),
            worker_shutdown_grace: WORKER_SHUTDOWN_GRACE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamReport {
    pub render: RenderReport,
    /// Results the worker forwarded; `None` if it was detached while busy.
    pub results_forwarded: Option<usize>,
}

/// Webcam → remote service → window, across two threads.
///
/// Layout: `main [capture → feed → draw → show]  ⇄  worker [frames → service → collect]`
///
/// The render loop owns the capture device and window on the calling
/// thread. A worker thread runs the service's response stream, which pulls
/// frames through a [`FrameIterator`], while a [`ResponseCollector`] pushes
/// results back. Both halves share one [`StopSignal`].
pub struct StreamingPipeline {
    config: StreamConfig,
    service: Box<dyn ProcessingService>,
    visualizer: Box<dyn Visualizer>,
}

impl StreamingPipeline {
    pub fn new(
        config: StreamConfig,
        service: Box<dyn ProcessingService>,
        visualizer: Box<dyn Visualizer>,
    ) -> Self {
        Self {
            config,
            service,
            visualizer,
        }
    }

    /// Streams until the user quits, the device ends, or the worker fails.
    ///
    /// A worker failure (e.g. frame timeout) is returned as the error after
    /// the render loop has shut down and released the device.
    pub fn start_streaming(
        self,
        source: &mut dyn FrameSource,
        display: &mut dyn DisplaySurface,
        logger: &mut dyn StreamLogger,
    ) -> Result<StreamReport, StreamError> {
        let StreamingPipeline {
            config,
            mut service,
            visualizer,
        } = self;

        let stop = StopSignal::new();
        let (frames_tx, frames_rx) = crossbeam_channel::bounded(1);
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        service.set_image_source(FrameIterator::new(
            frames_rx,
            stop.clone(),
            config.frame_timeout,
        ));
        let collector = ResponseCollector::new(results_tx, stop.clone());
        let worker = thread::spawn(move || {
            let outcome = collector.run(service.as_mut());
            let _ = done_tx.send(outcome);
        });
        log::info!("Worker started");

        let render_loop = RenderLoop::new(
            FrameFeeder::new(frames_tx),
            results_rx,
            visualizer,
            stop.clone(),
            config.display_wait,
        );
        let rendered = render_loop.run(source, display, logger);
        // Closing both queues wakes a worker blocked on either of them.
        drop(render_loop);

        let worker_outcome = match done_rx.recv_timeout(config.worker_shutdown_grace) {
            Ok(outcome) => {
                let _ = worker.join();
                Some(outcome)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.join();
                log::error!("Worker thread panicked");
                Some(Err(StreamError::WorkerPanicked))
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Worker still busy after {:?}; detaching it",
                    config.worker_shutdown_grace
                );
                None
            }
        };
        logger.summary();

        let render = rendered?;
        let results_forwarded = match worker_outcome {
            Some(Ok(count)) => Some(count),
            Some(Err(e)) => return Err(e),
            None => None,
        };
        Ok(StreamReport {
            render,
            results_forwarded,
        })
    }
}
