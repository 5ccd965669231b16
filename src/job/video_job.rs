use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    assets::fetch::{FetchOpts, Fetcher},
    encode::adapter::{EncodeOpts, encode},
    encode::ffmpeg::FfmpegSink,
    encode::sink::FrameSink,
    foundation::error::{AdreelError, AdreelResult},
    job::cancel::CancelToken,
    job::progress::{JobProgress, ProgressObserver, ProgressReporter},
    overlay::render::{OverlayCache, OverlayRenderer},
    render::frame::{Frame, build_with_margin},
    scene::manifest::JobManifest,
    scene::model::{ImageSource, SceneSpec, VideoStyleConfig},
    sequence::sequencer::{SceneFrame, Sequencer},
};

/// One end-to-end run producing exactly one video file.
///
/// A job owns a private working directory for its lifetime. The directory (and the staging
/// file inside it) is removed when the job ends, whether it succeeded, failed or was
/// cancelled. Nothing is ever left at the output path unless the job succeeded.
pub struct VideoJob {
    scenes: Vec<SceneSpec>,
    style: VideoStyleConfig,
    output_path: PathBuf,
    fetch: FetchOpts,
    encode: EncodeOpts,
    work_dir: tempfile::TempDir,
    cancel: CancelToken,
    progress: Option<ProgressObserver>,
    renderer: Option<OverlayRenderer>,
}

impl std::fmt::Debug for VideoJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoJob")
            .field("scenes", &self.scenes.len())
            .field("style", &self.style)
            .field("output_path", &self.output_path)
            .field("work_dir", &self.work_dir.path())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl VideoJob {
    /// Create a job whose working directory lives in the system temp dir.
    pub fn new(
        scenes: Vec<SceneSpec>,
        style: VideoStyleConfig,
        output_path: impl Into<PathBuf>,
    ) -> AdreelResult<Self> {
        Self::new_in(std::env::temp_dir(), scenes, style, output_path)
    }

    /// Create a job whose working directory is created under `work_root`.
    pub fn new_in(
        work_root: impl AsRef<Path>,
        scenes: Vec<SceneSpec>,
        style: VideoStyleConfig,
        output_path: impl Into<PathBuf>,
    ) -> AdreelResult<Self> {
        let work_root = work_root.as_ref();
        let io_err = |e: anyhow::Error| AdreelError::encode(format!("{e:#}"));
        std::fs::create_dir_all(work_root)
            .with_context(|| format!("create work root '{}'", work_root.display()))
            .map_err(io_err)?;
        let work_dir = tempfile::Builder::new()
            .prefix("adreel-job-")
            .tempdir_in(work_root)
            .with_context(|| format!("create job directory in '{}'", work_root.display()))
            .map_err(io_err)?;
        Ok(Self {
            scenes,
            style,
            output_path: output_path.into(),
            fetch: FetchOpts::default(),
            encode: EncodeOpts::default(),
            work_dir,
            cancel: CancelToken::new(),
            progress: None,
            renderer: None,
        })
    }

    /// Create a job from a manifest. `output` overrides the manifest's output path.
    pub fn from_manifest(
        manifest: JobManifest,
        output: Option<PathBuf>,
        work_root: Option<&Path>,
    ) -> AdreelResult<Self> {
        let output = output
            .or(manifest.output)
            .ok_or_else(|| AdreelError::config("no output path in manifest or arguments"))?;
        let job = match work_root {
            Some(root) => Self::new_in(root, manifest.scenes, manifest.style, output)?,
            None => Self::new(manifest.scenes, manifest.style, output)?,
        };
        Ok(job
            .with_fetch_opts(manifest.fetch)
            .with_encode_opts(manifest.encode))
    }

    /// Override image retrieval limits.
    pub fn with_fetch_opts(mut self, fetch: FetchOpts) -> Self {
        self.fetch = fetch;
        self
    }

    /// Override encoder tuning.
    pub fn with_encode_opts(mut self, encode: EncodeOpts) -> Self {
        self.encode = encode;
        self
    }

    /// Use a specific caption renderer instead of probing for fonts.
    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Observe progress at scene boundaries.
    pub fn with_progress(mut self, observer: impl FnMut(JobProgress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    /// Token that cancels this job at the next scene boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The job's private working directory.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Where the finished video is published.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Validate inputs before any work starts.
    pub fn validate(&self) -> AdreelResult<()> {
        if self.scenes.is_empty() {
            return Err(AdreelError::media_shape("job has no scenes"));
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            scene
                .validate()
                .map_err(|e| AdreelError::media_shape(format!("scene {i}: {e}")))?;
        }
        self.style.validate()?;
        self.encode.validate()
    }

    /// Run the job, encoding with the system `ffmpeg`.
    pub fn run(self) -> AdreelResult<PathBuf> {
        let mut sink = FfmpegSink::new(self.encode.sink_opts());
        self.run_with_sink(&mut sink)
    }

    /// Run the job against an arbitrary frame sink.
    #[tracing::instrument(
        name = "video_job",
        skip_all,
        fields(scenes = self.scenes.len(), out = %self.output_path.display())
    )]
    pub fn run_with_sink<S: FrameSink + ?Sized>(mut self, sink: &mut S) -> AdreelResult<PathBuf> {
        self.validate()?;
        self.cancel.check()?;

        let canvas = self.style.canvas;
        let fps = self.style.fps;
        let overlay_style = self.style.overlay.clone();
        let scenes_total = self.scenes.len();

        let sources: Vec<ImageSource> = self.scenes.iter().map(SceneSpec::source).collect();
        let fetcher = Fetcher::new(self.fetch.clone())?;
        let images = fetcher.fetch_all(&sources);
        tracing::info!(images = images.len(), "images fetched");

        let renderer = self
            .renderer
            .take()
            .unwrap_or_else(|| OverlayRenderer::from_style(&overlay_style));
        let mut overlays = OverlayCache::new();
        overlays.prepare(
            &renderer,
            self.scenes.iter().map(|s| s.caption.as_str()),
            canvas.width,
            &overlay_style,
        );
        tracing::info!(
            overlays = overlays.len(),
            backend = renderer.backend_name(),
            "captions rendered"
        );

        let scenes = std::mem::take(&mut self.scenes);
        let built = images
            .into_iter()
            .zip(scenes)
            .map(move |(image, scene)| -> AdreelResult<SceneFrame> {
                let overlay =
                    overlays.get_or_render(&renderer, &scene.caption, canvas.width, &overlay_style);
                let frame =
                    build_with_margin(&image, &overlay, canvas, overlay_style.bottom_margin)?;
                Ok(SceneFrame {
                    frame,
                    duration_seconds: scene.duration_seconds,
                })
            });

        let mut frames = Sequencer::new(built, fps, self.style.transition.clone())
            .with_cancel(self.cancel.clone())
            .with_progress(ProgressReporter::new(self.progress.take()));

        let published = encode(
            frames.by_ref(),
            fps,
            &self.output_path,
            sink,
            &self.encode,
            self.work_dir.path(),
        );
        let frames_emitted = frames.frames_emitted();
        let mut progress = frames.into_progress();
        let work_dir = self.work_dir.path().to_path_buf();
        if let Err(e) = self.work_dir.close() {
            tracing::warn!(dir = %work_dir.display(), error = %e, "failed to remove job directory");
        }

        match published {
            Ok(path) => {
                progress.report(JobProgress::complete(scenes_total));
                tracing::info!(frames = frames_emitted, "job complete");
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "job failed");
                Err(e)
            }
        }
    }

    /// Build the representative frame of one scene (used by the CLI `frame` command).
    pub fn scene_frame(&self, index: usize) -> AdreelResult<Frame> {
        self.style.validate()?;
        let scene = self.scenes.get(index).ok_or_else(|| {
            AdreelError::config(format!(
                "scene {index} out of range (job has {})",
                self.scenes.len()
            ))
        })?;
        scene.validate()?;

        let image = Fetcher::new(self.fetch.clone())?.fetch(&scene.source());
        let renderer = self
            .renderer
            .clone()
            .unwrap_or_else(|| OverlayRenderer::from_style(&self.style.overlay));
        let overlay = renderer.render(&scene.caption, self.style.canvas.width, &self.style.overlay);
        build_with_margin(
            &image,
            &overlay,
            self.style.canvas,
            self.style.overlay.bottom_margin,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/video_job.rs"]
mod tests;
