//! adreel turns product images and short captions into an H.264/MP4 video advert.
//!
//! The pipeline for one [`VideoJob`]:
//!
//! - fetch every scene image (local path or URL) with a bounded worker pool, substituting a
//!   fallback image for anything unusable
//! - render each distinct caption into a semi-transparent banner
//! - cover-crop each image to the output canvas and composite its banner
//! - expand scenes into a frame stream at a fixed rate, with optional transitions
//! - drain the stream into a [`FrameSink`] (normally `ffmpeg`) and publish the file atomically
//!
//! Only [`AdreelError::MediaShape`], [`AdreelError::Encode`] and [`AdreelError::Cancelled`]
//! (plus configuration problems) end a job; fetch and caption failures degrade gracefully.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image retrieval and decoding.
pub mod assets;
/// Transition kinds.
pub mod effects;
/// Encoding sinks and the encoder adapter.
pub mod encode;
/// Core types and errors.
pub mod foundation;
/// Job orchestration.
pub mod job;
/// Caption banner rendering.
pub mod overlay;
/// Frame building and compositing.
pub mod render;
/// Job inputs.
pub mod scene;
/// Frame stream sequencing.
pub mod sequence;

pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::fetch::{FetchOpts, Fetcher};
pub use crate::effects::transitions::{TransitionKind, WipeDir};
pub use crate::encode::adapter::{EncodeOpts, encode};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{AdreelError, AdreelResult};
pub use crate::job::cancel::CancelToken;
pub use crate::job::progress::JobProgress;
pub use crate::job::video_job::VideoJob;
pub use crate::overlay::render::{
    OverlayBitmap, OverlayCache, OverlayRenderer, font_dirs_from_env,
};
pub use crate::render::frame::{Frame, build};
pub use crate::scene::manifest::JobManifest;
pub use crate::scene::model::{
    ImageSource, OverlayStyle, SceneSpec, TransitionPolicy, TransitionSpec, VideoStyleConfig,
};
pub use crate::scene::script::{ScriptScene, parse_script, scenes_from_script};
pub use crate::sequence::sequencer::{SceneFrame, Sequencer, expand};
