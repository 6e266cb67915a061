use crossbeam_channel::{Sender, TrySendError};

use crate::shared::frame::Frame;

/// Render-loop side of the inbound queue.
///
/// Hands the current frame to the worker only when the previous one has
/// been picked up, so at most one frame is ever in flight. Never blocks.
pub struct FrameFeeder {
    tx: Sender<Frame>,
}

/// Outcome of [`FrameFeeder::offer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedOutcome {
    Queued,
    /// The worker has not picked up the previous frame yet.
    Dropped,
    /// The worker is gone.
    Disconnected,
}

impl FrameFeeder {
    pub fn new(tx: Sender<Frame>) -> Self {
        Self { tx }
    }

    /// Queues a copy of `frame` if the inbound queue is empty.
    pub fn offer(&self, frame: &Frame) -> FeedOutcome {
        if !self.tx.is_empty() {
            return FeedOutcome::Dropped;
        }
        match self.tx.try_send(frame.clone()) {
            Ok(()) => FeedOutcome::Queued,
            Err(TrySendError::Full(_)) => FeedOutcome::Dropped,
            Err(TrySendError::Disconnected(_)) => FeedOutcome::Disconnected,
        }
    }
}
