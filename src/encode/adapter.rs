use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::encode::ffmpeg::{FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::render::frame::Frame;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Encoder tuning and limits.
pub struct EncodeOpts {
    /// libx264 preset.
    pub preset: String,
    /// libx264 constant rate factor.
    pub crf: u8,
    /// Wall-clock budget for the whole encode; exceeding it fails the job.
    #[serde(with = "opt_secs_f64", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            preset: "veryfast".to_string(),
            crf: 23,
            timeout: None,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl EncodeOpts {
    /// Validate tuning values.
    pub fn validate(&self) -> AdreelResult<()> {
        if self.crf > 51 {
            return Err(AdreelError::config(format!(
                "encode crf must be within 0..=51 (got {})",
                self.crf
            )));
        }
        if self.preset.trim().is_empty() {
            return Err(AdreelError::config("encode preset must be non-empty"));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(AdreelError::config("encode timeout must be > 0 when set"));
        }
        Ok(())
    }

    /// Options for an [`FfmpegSink`](crate::FfmpegSink) honoring these settings.
    ///
    /// The `timeout` budget reaches the sink through [`SinkConfig::deadline`], so the sink
    /// gets no separate finish timeout.
    pub fn sink_opts(&self) -> FfmpegSinkOpts {
        FfmpegSinkOpts {
            ffmpeg: self.ffmpeg.clone(),
            preset: self.preset.clone(),
            crf: self.crf,
            finish_timeout: None,
        }
    }
}

mod opt_secs_f64 {
    use std::time::Duration;

    pub(super) fn serialize<S: serde::Serializer>(
        d: &Option<Duration>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = serde::Deserialize::deserialize(d)?;
        secs.map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

/// Drain `frames` into `sink` and publish the result at `output_path`.
///
/// The sink writes to a temporary file inside `staging_dir`. Only after the sink closes
/// cleanly is that file flushed to disk and renamed to `output_path`, so the published path
/// never holds a partial video. On any failure the sink is aborted and the staging file is
/// removed.
///
/// Errors:
/// - empty stream, or a frame whose size differs from the first: [`AdreelError::MediaShape`]
/// - sink failure or `opts.timeout` exceeded: [`AdreelError::Encode`]
/// - upstream errors (including [`AdreelError::Cancelled`]) are returned unchanged
pub fn encode<I, S>(
    frames: I,
    fps: Fps,
    output_path: &Path,
    sink: &mut S,
    opts: &EncodeOpts,
    staging_dir: &Path,
) -> AdreelResult<PathBuf>
where
    I: IntoIterator<Item = AdreelResult<Frame>>,
    S: FrameSink + ?Sized,
{
    let deadline = opts.timeout.map(|t| (t, Instant::now() + t));
    let mut frames = frames.into_iter();

    let first = match frames.next() {
        None => return Err(AdreelError::media_shape("frame stream is empty")),
        Some(first) => first?,
    };

    let staging = tempfile::Builder::new()
        .prefix(".adreel-")
        .suffix(".mp4.partial")
        .tempfile_in(staging_dir)
        .with_context(|| {
            format!(
                "failed to create staging file in '{}'",
                staging_dir.display()
            )
        })
        .map_err(|e| AdreelError::encode(format!("{e:#}")))?;

    let cfg = SinkConfig {
        width: first.width,
        height: first.height,
        fps,
        out_path: staging.path().to_path_buf(),
        deadline: deadline.map(|(_, at)| at),
    };
    tracing::debug!(
        width = cfg.width,
        height = cfg.height,
        staging = %cfg.out_path.display(),
        "encode start"
    );

    let written = match drain(first, frames, cfg, sink, deadline) {
        Ok(n) => n,
        Err(e) => {
            sink.abort();
            tracing::warn!(error = %e, "encode failed; partial output discarded");
            return Err(e);
        }
    };

    let published = publish(staging, output_path)?;
    tracing::info!(
        frames = written,
        out = %published.display(),
        "video published"
    );
    Ok(published)
}

fn drain<I, S>(
    first: Frame,
    rest: I,
    cfg: SinkConfig,
    sink: &mut S,
    deadline: Option<(Duration, Instant)>,
) -> AdreelResult<u64>
where
    I: Iterator<Item = AdreelResult<Frame>>,
    S: FrameSink + ?Sized,
{
    let (width, height) = (cfg.width, cfg.height);
    sink.begin(cfg)?;

    let check_deadline = || -> AdreelResult<()> {
        match deadline {
            Some((limit, at)) if Instant::now() > at => Err(AdreelError::encode(format!(
                "encode exceeded its {:.1}s budget",
                limit.as_secs_f64()
            ))),
            _ => Ok(()),
        }
    };

    let mut n = 0u64;
    for frame in std::iter::once(Ok(first)).chain(rest) {
        let frame = frame?;
        if (frame.width, frame.height) != (width, height) {
            return Err(AdreelError::media_shape(format!(
                "frame {n} is {}x{}, stream is {width}x{height}",
                frame.width, frame.height
            )));
        }
        sink.push_frame(FrameIndex(n), &frame)?;
        n += 1;
        check_deadline()?;
    }

    sink.end()?;
    check_deadline()?;
    Ok(n)
}

/// Flush the finished staging file and move it to `output_path`.
fn publish(staging: tempfile::NamedTempFile, output_path: &Path) -> AdreelResult<PathBuf> {
    let io_err = |e: anyhow::Error| AdreelError::encode(format!("{e:#}"));

    std::fs::File::open(staging.path())
        .and_then(|f| f.sync_all())
        .context("failed to flush staged video")
        .map_err(io_err)?;
    ensure_parent_dir(output_path)?;

    match staging.persist(output_path) {
        Ok(_) => Ok(output_path.to_path_buf()),
        Err(e) => {
            // Rename across filesystems fails; copy next to the target, then rename there.
            tracing::debug!(error = %e.error, "staging rename failed; copying");
            let staging = e.file;
            let dir = output_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let sibling = tempfile::Builder::new()
                .prefix(".adreel-")
                .suffix(".mp4.partial")
                .tempfile_in(dir)
                .with_context(|| format!("failed to stage output in '{}'", dir.display()))
                .map_err(io_err)?;
            std::fs::copy(staging.path(), sibling.path())
                .and_then(|_| sibling.as_file().sync_all())
                .context("failed to copy staged video")
                .map_err(io_err)?;
            sibling
                .persist(output_path)
                .map_err(|e| e.error)
                .with_context(|| format!("failed to publish '{}'", output_path.display()))
                .map_err(io_err)?;
            Ok(output_path.to_path_buf())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/adapter.rs"]
mod tests;
