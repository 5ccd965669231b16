use crate::foundation::error::{AdreelError, AdreelResult};

/// Absolute 0-based frame index in output stream order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
///
/// Deserializes from either a whole number (`24`) or an object (`{"num": 30000, "den": 1001}`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "FpsRepr")]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum FpsRepr {
    Whole(u32),
    Rational { num: u32, den: u32 },
}

impl TryFrom<FpsRepr> for Fps {
    type Error = AdreelError;

    fn try_from(value: FpsRepr) -> Result<Self, Self::Error> {
        match value {
            FpsRepr::Whole(n) => Fps::new(n, 1),
            FpsRepr::Rational { num, den } => Fps::new(num, den),
        }
    }
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> AdreelResult<Self> {
        if den == 0 {
            return Err(AdreelError::media_shape("fps den must be > 0"));
        }
        if num == 0 {
            return Err(AdreelError::media_shape("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Create a whole-number frame rate such as 24 or 30.
    pub fn whole(num: u32) -> AdreelResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Number of frames a scene of `secs` occupies: `max(1, round(secs * fps))`.
    pub fn scene_frames(self, secs: f64) -> u64 {
        let n = (secs * self.as_f64()).round();
        if n.is_finite() && n >= 1.0 { n as u64 } else { 1 }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Full HD, the default advert resolution.
    pub const FULL_HD: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    /// Validate the canvas for yuv420p H.264 output.
    pub fn validate(self) -> AdreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AdreelError::media_shape(
                "canvas width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(AdreelError::media_shape(format!(
                "canvas {}x{} must have even width/height (required for yuv420p mp4 output)",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Number of bytes in one tightly packed RGBA8 frame.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::FULL_HD
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
