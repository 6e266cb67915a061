use std::time::Duration;

use crossbeam_channel::{select, Receiver};

use crate::pipeline::stream_error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::stop_signal::StopSignal;

/// Worker-side view of the inbound queue as a lazy, pull-driven sequence.
///
/// Handed to the processing service, which calls `next()` for every frame
/// it submits upstream. The sequence ends when the stop signal is set or
/// the render loop goes away. If no frame shows up within `timeout`, it
/// yields a single [`StreamError::Timeout`], sets the stop signal and ends.
/// Once ended it stays ended.
pub struct FrameIterator {
    rx: Receiver<Frame>,
    stop: StopSignal,
    timeout: Duration,
    done: bool,
}

impl FrameIterator {
    pub fn new(rx: Receiver<Frame>, stop: StopSignal, timeout: Duration) -> Self {
        Self {
            rx,
            stop,
            timeout,
            done: false,
        }
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            log::info!("Webcam iterating was successfully stopped");
        }
    }
}

impl Iterator for FrameIterator {
    type Item = Result<Frame, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.stop.is_set() {
            self.finish();
            return None;
        }

        let pulled = select! {
            recv(self.rx) -> msg => msg.map_or(Pulled::Disconnected, Pulled::Frame),
            recv(self.stop.watch()) -> _ => Pulled::Stopped,
            default(self.timeout) => Pulled::TimedOut,
        };

        match pulled {
            // A stop that raced the frame still wins.
            Pulled::Frame(_) if self.stop.is_set() => {
                self.finish();
                None
            }
            Pulled::Frame(frame) => Some(Ok(frame)),
            Pulled::Stopped => {
                self.finish();
                None
            }
            Pulled::Disconnected => {
                log::debug!("Inbound queue disconnected");
                self.finish();
                None
            }
            Pulled::TimedOut => {
                log::warn!("Webcam timeout exceeded ({:?}). Aborting.", self.timeout);
                self.stop.set();
                self.finish();
                Some(Err(StreamError::Timeout(self.timeout)))
            }
        }
    }
}

enum Pulled {
    Frame(Frame),
    Stopped,
    Disconnected,
    TimedOut,
}

impl std::iter::FusedIterator for FrameIterator {}
