use std::path::PathBuf;
use std::time::Instant;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::render::frame::Frame;

/// Configuration provided to a [`FrameSink`] when a stream starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels (taken from the first frame).
    pub width: u32,
    /// Output height in pixels (taken from the first frame).
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// File the sink writes to. Sinks that keep frames in memory ignore it.
    pub out_path: PathBuf,
    /// Wall-clock instant by which the whole stream must be written and closed. Sinks that
    /// can block must give up with [`AdreelError::Encode`] once it passes.
    pub deadline: Option<Instant>,
}

/// Sink contract for consuming frames in stream order.
///
/// `push_frame` is called in strictly increasing [`FrameIndex`] order between one `begin`
/// and either `end` (success) or `abort` (any failure). After `abort` the sink must hold no
/// open writer, process or file handle.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> AdreelResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> AdreelResult<()>;
    /// Flush and close after the last frame.
    fn end(&mut self) -> AdreelResult<()>;
    /// Release everything after a failure. Must be safe to call in any state.
    fn abort(&mut self) {}
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin(&mut self, cfg: SinkConfig) -> AdreelResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> AdreelResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> AdreelResult<()> {
        (**self).end()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// In-memory sink for tests and debugging.
///
/// Frames share pixel storage with the producer, so repeated scene frames cost no copies.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Frame)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    /// Return `true` once `end` succeeded.
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Return `true` once `abort` was called.
    pub fn aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> AdreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> AdreelResult<()> {
        if self.cfg.is_none() {
            return Err(AdreelError::encode("in-memory sink not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> AdreelResult<()> {
        if self.cfg.is_none() {
            return Err(AdreelError::encode("in-memory sink not started"));
        }
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
