use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::render::frame::Frame;

/// Frames buffered between the caller and the stdin writer thread.
const FRAME_QUEUE: usize = 4;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug, PartialEq)]
pub struct FfmpegSinkOpts {
    /// `ffmpeg` executable (name resolved on `PATH`, or a path).
    pub ffmpeg: PathBuf,
    /// libx264 preset.
    pub preset: String,
    /// libx264 constant rate factor (0-51).
    pub crf: u8,
    /// Upper bound for `ffmpeg` to finish after the last frame. [`SinkConfig::deadline`]
    /// still applies when it is earlier.
    pub finish_timeout: Option<Duration>,
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            preset: "veryfast".to_string(),
            crf: 23,
            finish_timeout: None,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// Output is H.264 (libx264, yuv420p) in an MP4 container with `+faststart`, written to
/// [`SinkConfig::out_path`]. Frames are written by a dedicated thread through a bounded
/// queue, so an `ffmpeg` that stops reading stalls the queue rather than the caller; once
/// [`SinkConfig::deadline`] passes the process is killed and the sink fails with
/// [`AdreelError::Encode`]. `ffmpeg` stderr is drained on a thread and attached to errors.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    frames_tx: Option<SyncSender<Arc<Vec<u8>>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    frame_len: usize,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("running", &self.child.is_some())
            .field("cfg", &self.cfg)
            .finish()
    }
}

enum QueueError {
    Closed,
    TimedOut,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            frames_tx: None,
            writer: None,
            stderr_drain: None,
            cfg: None,
            frame_len: 0,
            last_idx: None,
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            &self.opts.preset,
            "-crf",
            &self.opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]);
        cmd.arg(&cfg.out_path);
        cmd
    }

    fn join_stderr(&mut self) -> AdreelResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AdreelError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| AdreelError::encode(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn stream_deadline(&self) -> Option<Instant> {
        self.cfg.as_ref().and_then(|c| c.deadline)
    }

    /// Earliest of the stream deadline and `finish_timeout` counted from now.
    fn finish_deadline(&self) -> Option<Instant> {
        let finish = self.opts.finish_timeout.map(|t| Instant::now() + t);
        match (finish, self.stream_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Wait for the writer thread to flush every queued frame and close stdin.
    fn finish_writer(&mut self, deadline: Option<Instant>) -> AdreelResult<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        if let Some(at) = deadline {
            while !writer.is_finished() {
                if Instant::now() >= at {
                    self.writer = Some(writer);
                    return Err(AdreelError::encode(
                        "ffmpeg stopped reading frames before the encode deadline",
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
        match writer.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AdreelError::encode(format!(
                "failed to write frames to ffmpeg stdin: {e}"
            ))),
            Err(_) => Err(AdreelError::encode("ffmpeg stdin writer thread panicked")),
        }
    }
}

fn send_before(
    tx: &SyncSender<Arc<Vec<u8>>>,
    mut pixels: Arc<Vec<u8>>,
    deadline: Option<Instant>,
) -> Result<(), QueueError> {
    let Some(at) = deadline else {
        return tx.send(pixels).map_err(|_| QueueError::Closed);
    };
    loop {
        match tx.try_send(pixels) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Disconnected(_)) => return Err(QueueError::Closed),
            Err(TrySendError::Full(p)) => {
                if Instant::now() >= at {
                    return Err(QueueError::TimedOut);
                }
                pixels = p;
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn wait_before(child: &mut Child, deadline: Option<Instant>) -> AdreelResult<ExitStatus> {
    let Some(at) = deadline else {
        return child
            .wait()
            .map_err(|e| AdreelError::encode(format!("failed to wait for ffmpeg to finish: {e}")));
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= at => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdreelError::encode(
                    "ffmpeg did not finish before the encode deadline",
                ));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(AdreelError::encode(format!(
                    "failed to poll ffmpeg status: {e}"
                )));
            }
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> AdreelResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(AdreelError::media_shape(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(AdreelError::media_shape(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.child.is_some() {
            return Err(AdreelError::encode("ffmpeg sink already started"));
        }

        ensure_parent_dir(&cfg.out_path)?;

        if !is_ffmpeg_available(&self.opts.ffmpeg) {
            return Err(AdreelError::encode(format!(
                "ffmpeg is required for MP4 encoding, but '{}' could not be run",
                self.opts.ffmpeg.display()
            )));
        }

        let mut child = self.command(&cfg).spawn().map_err(|e| {
            AdreelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AdreelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AdreelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });
        let (frames_tx, frames_rx) = mpsc::sync_channel::<Arc<Vec<u8>>>(FRAME_QUEUE);
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            for pixels in frames_rx {
                stdin.write_all(&pixels)?;
            }
            stdin.flush()
        });

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps.as_f64(),
            out = %cfg.out_path.display(),
            "ffmpeg started"
        );

        self.frame_len = cfg.width as usize * cfg.height as usize * 4;
        self.child = Some(child);
        self.frames_tx = Some(frames_tx);
        self.writer = Some(writer);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> AdreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AdreelError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(AdreelError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(AdreelError::media_shape(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.pixels.len() != self.frame_len {
            return Err(AdreelError::media_shape(
                "frame buffer size mismatch with width*height*4",
            ));
        }

        let Some(tx) = self.frames_tx.as_ref() else {
            return Err(AdreelError::encode("ffmpeg sink is already finalized"));
        };
        match send_before(tx, Arc::clone(&frame.pixels), self.stream_deadline()) {
            Ok(()) => Ok(()),
            Err(QueueError::TimedOut) => {
                self.abort();
                Err(AdreelError::encode(format!(
                    "ffmpeg did not accept frame {} before the encode deadline",
                    idx.0
                )))
            }
            Err(QueueError::Closed) => {
                // The writer only stops early when ffmpeg closed its stdin; stderr says why.
                let cause = match self.finish_writer(None) {
                    Err(e) => e.to_string(),
                    Ok(()) => "ffmpeg closed its input".to_string(),
                };
                self.abort();
                let stderr = self.join_stderr().unwrap_or_default();
                Err(AdreelError::encode(format!(
                    "failed to write frame {}: {cause}: {}",
                    idx.0,
                    String::from_utf8_lossy(&stderr).trim()
                )))
            }
        }
    }

    fn end(&mut self) -> AdreelResult<()> {
        if self.child.is_none() {
            return Err(AdreelError::encode("ffmpeg sink not started"));
        }
        drop(self.frames_tx.take());
        let deadline = self.finish_deadline();

        if let Err(e) = self.finish_writer(deadline) {
            self.abort();
            return Err(e);
        }
        let Some(mut child) = self.child.take() else {
            return Err(AdreelError::encode("ffmpeg sink not started"));
        };
        let status = wait_before(&mut child, deadline)?;
        let stderr_bytes = self.join_stderr()?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(AdreelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.frames_tx.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("ffmpeg aborted");
        }
        // With the process gone a blocked write fails fast; anything still running is detached.
        if let Some(writer) = self.writer.take()
            && writer.is_finished()
        {
            let _ = writer.join();
        }
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
        drop(self.stderr_drain.take());
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rawvideo input rate goes before `-i`, as a rational.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AdreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AdreelError::encode(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_ffmpeg_available(Path::new("ffmpeg"))
}

/// Return `true` when `program -version` runs successfully.
pub fn is_ffmpeg_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
