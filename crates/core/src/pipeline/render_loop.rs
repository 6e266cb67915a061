use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::capture::domain::frame_source::FrameSource;
use crate::display::domain::display_surface::DisplaySurface;
use crate::pipeline::frame_feeder::{FeedOutcome, FrameFeeder};
use crate::pipeline::stream_error::StreamError;
use crate::pipeline::stream_logger::StreamLogger;
use crate::shared::detection::DetectionResult;
use crate::shared::stop_signal::StopSignal;
use crate::visualization::domain::visualizer::Visualizer;

/// Why the render loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The capture device ran out of frames.
    EndOfStream,
    /// The capture device reported an error.
    CaptureFailed,
    /// Another component set the stop signal.
    Stopped,
    /// The user pressed the quit key or closed the window.
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderReport {
    pub exit: ExitReason,
    pub frames_rendered: usize,
    pub results_received: usize,
}

/// Main-thread loop: capture, feed the worker, draw the newest result, show.
pub struct RenderLoop {
    feeder: FrameFeeder,
    results_rx: Receiver<DetectionResult>,
    visualizer: Box<dyn Visualizer>,
    stop: StopSignal,
    display_wait: Duration,
}

impl RenderLoop {
    pub fn new(
        feeder: FrameFeeder,
        results_rx: Receiver<DetectionResult>,
        visualizer: Box<dyn Visualizer>,
        stop: StopSignal,
        display_wait: Duration,
    ) -> Self {
        Self {
            feeder,
            results_rx,
            visualizer,
            stop,
            display_wait,
        }
    }

    /// Runs until end of stream, capture failure, stop signal or quit.
    ///
    /// Whatever the exit path, the stop signal is set and `source` is
    /// released exactly once before returning.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        display: &mut dyn DisplaySurface,
        logger: &mut dyn StreamLogger,
    ) -> Result<RenderReport, StreamError> {
        let outcome = self.run_loop(source, display, logger);
        self.stop.set();
        source.release();
        if let Ok(report) = &outcome {
            log::info!(
                "Render loop exited ({:?}) after {} frames",
                report.exit,
                report.frames_rendered
            );
        }
        outcome
    }

    fn run_loop(
        &self,
        source: &mut dyn FrameSource,
        display: &mut dyn DisplaySurface,
        logger: &mut dyn StreamLogger,
    ) -> Result<RenderReport, StreamError> {
        let mut last_result: Option<DetectionResult> = None;
        let mut frames_rendered = 0;
        let mut results_received = 0;

        let exit = loop {
            let mut frame = match source.capture_next() {
                Ok(Some(frame)) => frame,
                Ok(None) => break ExitReason::EndOfStream,
                Err(e) => {
                    log::warn!("Capture failed, treating as end of stream: {e}");
                    break ExitReason::CaptureFailed;
                }
            };
            if self.stop.is_set() {
                break ExitReason::Stopped;
            }
            logger.frame_captured(frame.index());

            match self.feeder.offer(&frame) {
                FeedOutcome::Queued => {}
                FeedOutcome::Dropped => logger.frame_dropped(frame.index()),
                FeedOutcome::Disconnected => log::debug!("Worker gone; frame not submitted"),
            }

            // Keep only the newest result so stale ones never pile up.
            if let Some(result) = self.results_rx.try_iter().last() {
                results_received += 1;
                logger.result_received(result.values().map(Vec::len).sum());
                last_result = Some(result);
            }

            let started = Instant::now();
            if let Some(result) = &last_result {
                self.visualizer
                    .render(&mut frame, result)
                    .map_err(|e| StreamError::Render(e.to_string()))?;
            }
            logger.timing("render", elapsed_ms(started));

            let started = Instant::now();
            display
                .show(&frame)
                .map_err(|e| StreamError::Display(e.to_string()))?;
            frames_rendered += 1;
            let quit = display.wait_for_quit(self.display_wait);
            logger.timing("display", elapsed_ms(started));
            if quit {
                break ExitReason::Quit;
            }
        };

        Ok(RenderReport {
            exit,
            frames_rendered,
            results_received,
        })
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
