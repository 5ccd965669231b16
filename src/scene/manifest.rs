use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{
    assets::fetch::FetchOpts,
    encode::adapter::EncodeOpts,
    foundation::error::{AdreelError, AdreelResult},
    scene::model::{ImageSource, SceneSpec, VideoStyleConfig},
};

/// JSON job description consumed by the `adreel` CLI.
///
/// ```json
/// {
///   "scenes": [
///     { "image_source": "chair.jpg", "caption": "Sit better", "duration_seconds": 3 }
///   ],
///   "output": "out/chair.mp4",
///   "style": { "fps": 30, "transition": { "kind": "crossfade", "frames": 12 } }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobManifest {
    /// Ordered scenes.
    pub scenes: Vec<SceneSpec>,
    /// Output MP4 path; the CLI `--out` flag overrides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Video style.
    #[serde(default)]
    pub style: VideoStyleConfig,
    /// Image retrieval limits.
    #[serde(default)]
    pub fetch: FetchOpts,
    /// Encoder tuning.
    #[serde(default)]
    pub encode: EncodeOpts,
}

impl JobManifest {
    /// Parse a manifest from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> AdreelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| AdreelError::config(format!("parse job manifest JSON: {e}")))
    }

    /// Parse a manifest file; relative local image paths and the output path are resolved
    /// against the manifest's directory.
    pub fn from_path(path: impl AsRef<Path>) -> AdreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AdreelError::config(format!("open job manifest '{}': {e}", path.display()))
        })?;
        let mut manifest = Self::from_reader(BufReader::new(f))?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            manifest.resolve_relative_to(base);
        }
        Ok(manifest)
    }

    /// Rebase relative local paths onto `base`. Remote sources are left untouched.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for scene in &mut self.scenes {
            if let ImageSource::Local(p) = scene.source()
                && p.is_relative()
            {
                scene.image_source = base.join(p).to_string_lossy().into_owned();
            }
        }
        if let Some(out) = self.output.as_mut()
            && out.is_relative()
        {
            *out = base.join(&*out);
        }
    }

    /// Validate everything the job will need before any work starts.
    pub fn validate(&self) -> AdreelResult<()> {
        if self.scenes.is_empty() {
            return Err(AdreelError::media_shape("manifest has no scenes"));
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            scene
                .validate()
                .map_err(|e| AdreelError::media_shape(format!("scene {i}: {e}")))?;
        }
        self.style.validate()?;
        self.encode.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manifest.rs"]
mod tests;
