use std::path::PathBuf;

use crate::{
    effects::transitions::{TransitionKind, parse_transition_kind_params},
    foundation::core::{Canvas, Fps},
    foundation::error::{AdreelError, AdreelResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One (image, caption, duration) unit of the output video.
pub struct SceneSpec {
    /// Local path, `file://` URL or `http(s)://` URL of the scene image.
    pub image_source: String,
    /// Caption rendered into the bottom overlay banner.
    pub caption: String,
    /// Scene duration in seconds; must be finite and > 0.
    pub duration_seconds: f64,
}

impl SceneSpec {
    /// Create a scene spec.
    pub fn new(
        image_source: impl Into<String>,
        caption: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            image_source: image_source.into(),
            caption: caption.into(),
            duration_seconds,
        }
    }

    /// Resolve the image reference into a tagged source.
    pub fn source(&self) -> ImageSource {
        ImageSource::from(self.image_source.as_str())
    }

    /// Validate scene invariants.
    pub fn validate(&self) -> AdreelResult<()> {
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(AdreelError::media_shape(format!(
                "scene duration must be finite and > 0 (got {})",
                self.duration_seconds
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Where a scene image comes from.
pub enum ImageSource {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// An `http`/`https` URL.
    Remote(reqwest::Url),
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if (lower.starts_with("http://") || lower.starts_with("https://"))
            && let Ok(url) = reqwest::Url::parse(trimmed)
        {
            return Self::Remote(url);
        }
        if lower.starts_with("file://")
            && let Ok(url) = reqwest::Url::parse(trimmed)
            && let Ok(path) = url.to_file_path()
        {
            return Self::Local(path);
        }
        Self::Local(PathBuf::from(trimmed))
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(p) => write!(f, "{}", p.display()),
            Self::Remote(u) => write!(f, "{u}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Caption banner styling.
pub struct OverlayStyle {
    /// Font size in pixels.
    pub font_size_px: f32,
    /// Line height as a multiple of `font_size_px`.
    pub line_height: f32,
    /// Text color (RGB).
    pub text_rgb: [u8; 3],
    /// Banner background color (RGB).
    pub background_rgb: [u8; 3],
    /// Banner background opacity in `[0, 1]`.
    pub background_alpha: f32,
    /// Horizontal padding in pixels on each side of the text block.
    pub padding_x: u32,
    /// Vertical padding in pixels above and below the text block.
    pub padding_y: u32,
    /// Gap between the banner and the bottom edge of the frame.
    pub bottom_margin: u32,
    /// Font family requested from the font database.
    pub font_family: String,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_size_px: 70.0,
            line_height: 1.25,
            text_rgb: [255, 255, 255],
            background_rgb: [0, 0, 0],
            background_alpha: 0.6,
            padding_x: 40,
            padding_y: 24,
            bottom_margin: 0,
            font_family: "sans-serif".to_string(),
            font_dirs: Vec::new(),
        }
    }
}

impl OverlayStyle {
    /// Upper bound for paddings and the bottom margin.
    pub const MAX_SPACING_PX: u32 = 8192;

    /// Validate style values.
    pub fn validate(&self) -> AdreelResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(AdreelError::config("overlay font_size_px must be finite and > 0"));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(AdreelError::config("overlay line_height must be finite and > 0"));
        }
        if !(0.0..=1.0).contains(&self.background_alpha) {
            return Err(AdreelError::config(
                "overlay background_alpha must be within [0, 1]",
            ));
        }
        for (name, px) in [
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
            ("bottom_margin", self.bottom_margin),
        ] {
            if px > Self::MAX_SPACING_PX {
                return Err(AdreelError::config(format!(
                    "overlay {name} must be at most {} px (got {px})",
                    Self::MAX_SPACING_PX
                )));
            }
        }
        Ok(())
    }

    /// Line advance in whole pixels.
    pub fn line_height_px(&self) -> u32 {
        (self.font_size_px * self.line_height).ceil().max(1.0) as u32
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Serialized transition description, parsed into a [`TransitionPolicy`].
pub struct TransitionSpec {
    /// Transition kind identifier (`none`, `crossfade`, `wipe`).
    pub kind: String,
    /// Number of blended frames inserted between adjacent scenes.
    #[serde(default)]
    pub frames: u32,
    /// Kind-specific parameters.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
/// Transition inserted between every pair of adjacent scenes.
pub struct TransitionPolicy {
    /// How the two scene frames are blended.
    pub kind: TransitionKind,
    /// Frames inserted per transition; independent of scene durations.
    pub frames: u32,
}

impl TransitionPolicy {
    /// Hard cuts between scenes.
    pub const CUT: TransitionPolicy = TransitionPolicy {
        kind: TransitionKind::Cut,
        frames: 0,
    };

    /// Linear cross-dissolve over `frames` frames.
    pub fn crossfade(frames: u32) -> Self {
        Self {
            kind: TransitionKind::Crossfade,
            frames,
        }
    }

    /// Number of frames actually inserted between two scenes.
    pub fn inserted_frames(&self) -> u32 {
        match self.kind {
            TransitionKind::Cut => 0,
            _ => self.frames,
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::CUT
    }
}

impl TryFrom<TransitionSpec> for TransitionPolicy {
    type Error = AdreelError;

    fn try_from(spec: TransitionSpec) -> Result<Self, Self::Error> {
        let kind = parse_transition_kind_params(&spec.kind, &spec.params)?;
        Ok(Self {
            kind,
            frames: spec.frames,
        })
    }
}

impl From<TransitionPolicy> for TransitionSpec {
    fn from(policy: TransitionPolicy) -> Self {
        let (kind, params) = policy.kind.to_kind_params();
        Self {
            kind,
            frames: policy.frames,
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Immutable per-job video settings.
///
/// Built once before the job starts and never mutated afterwards.
pub struct VideoStyleConfig {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Caption banner styling.
    pub overlay: OverlayStyle,
    /// Transition inserted between adjacent scenes.
    #[serde(with = "transition_serde")]
    pub transition: TransitionPolicy,
}

impl Default for VideoStyleConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::FULL_HD,
            fps: Fps { num: 24, den: 1 },
            overlay: OverlayStyle::default(),
            transition: TransitionPolicy::default(),
        }
    }
}

impl VideoStyleConfig {
    /// Validate canvas, fps and overlay style.
    pub fn validate(&self) -> AdreelResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        self.overlay.validate()
    }
}

mod transition_serde {
    use super::{TransitionPolicy, TransitionSpec};

    pub(super) fn serialize<S>(policy: &TransitionPolicy, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&TransitionSpec::from(policy.clone()), s)
    }

    pub(super) fn deserialize<'de, D>(d: D) -> Result<TransitionPolicy, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let spec: TransitionSpec = serde::Deserialize::deserialize(d)?;
        TransitionPolicy::try_from(spec).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
