//! In-memory stand-ins for the capture device, window and remote service.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::capture::domain::frame_source::FrameSource;
use crate::display::domain::display_surface::DisplaySurface;
use crate::pipeline::frame_iterator::FrameIterator;
use crate::pipeline::stream_error::StreamError;
use crate::service::domain::processing_service::{
    ImageResult, ProcessingService, ResponseStream, ServiceResponse,
};
use crate::shared::detection::DetectionResult;
use crate::shared::frame::Frame;

pub fn response(payloads: &[&str]) -> ServiceResponse {
    ServiceResponse {
        images: payloads
            .iter()
            .map(|p| ImageResult {
                result: p.to_string(),
            })
            .collect(),
    }
}

/// Scripted capture device. Shares its release counter with the test.
pub struct FakeFrameSource {
    frames: VecDeque<Result<Frame, String>>,
    released: Rc<RefCell<usize>>,
    /// Keep producing blank frames after the script runs out.
    endless: bool,
    next_index: usize,
}

impl FakeFrameSource {
    pub fn new(count: usize) -> (Self, Rc<RefCell<usize>>) {
        Self::from_script((0..count).map(|i| Ok(Frame::blank(32, 32, i))).collect())
    }

    pub fn endless() -> (Self, Rc<RefCell<usize>>) {
        let (mut source, released) = Self::from_script(Vec::new());
        source.endless = true;
        (source, released)
    }

    pub fn from_script(script: Vec<Result<Frame, String>>) -> (Self, Rc<RefCell<usize>>) {
        let released = Rc::new(RefCell::new(0));
        let source = Self {
            next_index: script.len(),
            frames: script.into(),
            released: released.clone(),
            endless: false,
        };
        (source, released)
    }
}

impl FrameSource for FakeFrameSource {
    fn capture_next(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        match self.frames.pop_front() {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e.into()),
            None if self.endless => {
                self.next_index += 1;
                Ok(Some(Frame::blank(32, 32, self.next_index - 1)))
            }
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        *self.released.borrow_mut() += 1;
    }
}

/// Records every frame shown; requests quit after `quit_after` frames.
pub struct RecordingDisplay {
    pub shown: Rc<RefCell<Vec<Frame>>>,
    quit_after: Option<usize>,
    quit_when: Option<fn(&Frame) -> bool>,
    wait: Duration,
}

impl RecordingDisplay {
    pub fn new(quit_after: Option<usize>) -> (Self, Rc<RefCell<Vec<Frame>>>) {
        let shown = Rc::new(RefCell::new(Vec::new()));
        let display = Self {
            shown: shown.clone(),
            quit_after,
            quit_when: None,
            wait: Duration::ZERO,
        };
        (display, shown)
    }

    /// Also quits as soon as a shown frame matches `predicate`.
    pub fn until(mut self, predicate: fn(&Frame) -> bool) -> Self {
        self.quit_when = Some(predicate);
        self
    }

    /// Sleeps for `wait` on every quit check, like a real window would.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }
}

impl DisplaySurface for RecordingDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.shown.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn wait_for_quit(&mut self, timeout: Duration) -> bool {
        std::thread::sleep(self.wait.min(timeout));
        let shown = self.shown.borrow();
        let matched = match (self.quit_when, shown.last()) {
            (Some(predicate), Some(frame)) => predicate(frame),
            _ => false,
        };
        matched || self.quit_after.is_some_and(|n| shown.len() >= n)
    }
}

/// How [`ScriptedService`] produces responses.
pub enum Script {
    /// Replays fixed responses, ignoring the image source.
    Replay(Vec<Result<ServiceResponse, StreamError>>),
    /// Answers every pulled frame with the given payload.
    Echo(&'static str),
    /// Pulls frames but never answers.
    Silent,
    /// Panics as soon as the stream is requested.
    Panic,
}

pub struct ScriptedService {
    script: Option<Script>,
    frames: Option<FrameIterator>,
    fail_postprocess: bool,
}

impl ScriptedService {
    pub fn new(script: Script) -> Self {
        Self {
            script: Some(script),
            frames: None,
            fail_postprocess: false,
        }
    }

    pub fn failing_postprocess(mut self) -> Self {
        self.fail_postprocess = true;
        self
    }
}

impl ProcessingService for ScriptedService {
    fn set_image_source(&mut self, frames: FrameIterator) {
        self.frames = Some(frames);
    }

    fn process_stream(&mut self) -> ResponseStream {
        let frames = self.frames.take();
        match self.script.take() {
            Some(Script::Replay(responses)) => Box::new(responses.into_iter()),
            Some(Script::Echo(payload)) => match frames {
                Some(frames) => Box::new(frames.map(move |f| f.map(|_| response(&[payload])))),
                None => Box::new(std::iter::empty::<Result<ServiceResponse, StreamError>>()),
            },
            Some(Script::Silent) => match frames {
                Some(frames) => Box::new(frames.filter_map(|f| f.err().map(Err::<ServiceResponse, StreamError>))),
                None => Box::new(std::iter::empty::<Result<ServiceResponse, StreamError>>()),
            },
            Some(Script::Panic) => panic!("scripted service crashed"),
            None => Box::new(std::iter::empty::<Result<ServiceResponse, StreamError>>()),
        }
    }

    fn postprocess(&self, result: DetectionResult) -> Result<DetectionResult, StreamError> {
        if self.fail_postprocess {
            return Err(StreamError::Postprocess("scripted failure".to_string()));
        }
        Ok(result)
    }
}
