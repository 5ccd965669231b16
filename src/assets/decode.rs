use crate::foundation::error::{AdreelError, AdreelResult};

/// Width of the substitute image returned when a source cannot be used.
pub const FALLBACK_WIDTH: u32 = 1920;
/// Height of the substitute image returned when a source cannot be used.
pub const FALLBACK_HEIGHT: u32 = 1080;
/// Solid color of the substitute image.
pub const FALLBACK_RGB: [u8; 3] = [0, 0, 0];

/// A decoded bitmap with 1 (gray), 3 (RGB) or 4 (RGBA, straight alpha) channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels, always >= 1 once validated.
    pub width: u32,
    /// Height in pixels, always >= 1 once validated.
    pub height: u32,
    /// Interleaved channels per pixel.
    pub channel_count: u8,
    /// Row-major, tightly packed pixel bytes.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Build an image from raw parts, validating the shape.
    pub fn from_raw(
        width: u32,
        height: u32,
        channel_count: u8,
        pixels: Vec<u8>,
    ) -> AdreelResult<Self> {
        let img = Self {
            width,
            height,
            channel_count,
            pixels,
        };
        img.validate()?;
        Ok(img)
    }

    /// The deterministic substitute image: solid [`FALLBACK_RGB`] at
    /// [`FALLBACK_WIDTH`]x[`FALLBACK_HEIGHT`].
    pub fn fallback() -> Self {
        let px = (FALLBACK_WIDTH as usize) * (FALLBACK_HEIGHT as usize);
        let mut pixels = Vec::with_capacity(px * 3);
        for _ in 0..px {
            pixels.extend_from_slice(&FALLBACK_RGB);
        }
        Self {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
            channel_count: 3,
            pixels,
        }
    }

    /// Check dimensions, channel count and buffer length.
    pub fn validate(&self) -> AdreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AdreelError::fetch(format!(
                "decoded image has zero dimension ({}x{})",
                self.width, self.height
            )));
        }
        if !matches!(self.channel_count, 1 | 3 | 4) {
            return Err(AdreelError::fetch(format!(
                "unsupported channel count {}",
                self.channel_count
            )));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(usize::from(self.channel_count)))
            .ok_or_else(|| AdreelError::fetch("decoded image size overflow"))?;
        if self.pixels.len() != expected {
            return Err(AdreelError::fetch(format!(
                "pixel buffer length {} does not match {}x{}x{}",
                self.pixels.len(),
                self.width,
                self.height,
                self.channel_count
            )));
        }
        Ok(())
    }

    /// Expand into an RGBA8 image buffer (straight alpha).
    pub fn to_rgba_image(&self) -> AdreelResult<image::RgbaImage> {
        self.validate()?;
        let rgba = match self.channel_count {
            4 => self.pixels.clone(),
            3 => {
                let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
                for px in self.pixels.chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                out
            }
            _ => {
                let mut out = Vec::with_capacity(self.pixels.len() * 4);
                for &l in &self.pixels {
                    out.extend_from_slice(&[l, l, l, 255]);
                }
                out
            }
        };
        image::RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| AdreelError::media_shape("rgba buffer does not match image size"))
    }
}

/// Decode encoded image bytes (format sniffed from content) into a [`DecodedImage`].
///
/// Gray images keep one channel, gray+alpha and RGBA become four, everything else three.
pub fn decode_image(bytes: &[u8]) -> AdreelResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(AdreelError::fetch("image bytes are empty"));
    }
    let format = image::guess_format(bytes)
        .map_err(|e| AdreelError::fetch(format!("unrecognized image format: {e}")))?;
    let dyn_img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AdreelError::fetch(format!("decode {format:?} image: {e}")))?;

    let color = dyn_img.color();
    let (channel_count, width, height, pixels) = if !color.has_color() && !color.has_alpha() {
        let gray = dyn_img.to_luma8();
        let (w, h) = gray.dimensions();
        (1u8, w, h, gray.into_raw())
    } else if color.has_alpha() {
        let rgba = dyn_img.to_rgba8();
        let (w, h) = rgba.dimensions();
        (4u8, w, h, rgba.into_raw())
    } else {
        let rgb = dyn_img.to_rgb8();
        let (w, h) = rgb.dimensions();
        (3u8, w, h, rgb.into_raw())
    };

    DecodedImage::from_raw(width, height, channel_count, pixels)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
