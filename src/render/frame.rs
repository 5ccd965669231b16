use std::sync::Arc;

use image::imageops::{self, FilterType};

use crate::{
    assets::decode::DecodedImage,
    foundation::core::{Canvas, FrameIndex},
    foundation::error::{AdreelError, AdreelResult},
    foundation::math::{blend_channel, mul_div255_u8},
    overlay::render::OverlayBitmap,
};

/// A fully composited, opaque RGBA8 frame at output resolution.
///
/// Pixels are shared behind an [`Arc`] so repeating a scene frame does not copy it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Position in the output stream.
    pub index: FrameIndex,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes, alpha always 255.
    pub pixels: Arc<Vec<u8>>,
}

impl Frame {
    /// Wrap an RGBA8 buffer, checking its length.
    pub fn new(index: FrameIndex, width: u32, height: u32, pixels: Vec<u8>) -> AdreelResult<Self> {
        let expected = Canvas { width, height }.rgba_len();
        if pixels.len() != expected {
            return Err(AdreelError::media_shape(format!(
                "frame buffer holds {} bytes, {width}x{height} needs {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            index,
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// The same pixels tagged with another stream position.
    pub fn with_index(&self, index: FrameIndex) -> Self {
        Self {
            index,
            width: self.width,
            height: self.height,
            pixels: Arc::clone(&self.pixels),
        }
    }

    /// Frame dimensions as a canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Copy into an `image` buffer (for PNG export).
    pub fn to_rgba_image(&self) -> AdreelResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.as_ref().clone())
            .ok_or_else(|| AdreelError::media_shape("frame buffer does not match its size"))
    }
}

/// Build a scene frame with the overlay flush against the bottom edge.
pub fn build(image: &DecodedImage, overlay: &OverlayBitmap, canvas: Canvas) -> AdreelResult<Frame> {
    build_with_margin(image, overlay, canvas, 0)
}

/// Cover-scale and center-crop `image` to `canvas`, then blend `overlay` onto the bottom
/// region, `bottom_margin` pixels above the bottom edge.
///
/// The result always has exactly the canvas dimensions; the input is not modified.
pub fn build_with_margin(
    image: &DecodedImage,
    overlay: &OverlayBitmap,
    canvas: Canvas,
    bottom_margin: u32,
) -> AdreelResult<Frame> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(AdreelError::media_shape("frame canvas must be non-zero"));
    }
    let mut base = cover_crop(&image.to_rgba_image()?, canvas);
    flatten_over_black(&mut base);
    let mut pixels = base.into_raw();
    blend_overlay(&mut pixels, canvas, overlay, bottom_margin)?;
    Frame::new(FrameIndex(0), canvas.width, canvas.height, pixels)
}

/// Source rectangle `(x, y, w, h)` with the canvas aspect ratio, centered in `src_w x src_h`.
pub(crate) fn cover_rect(src_w: u32, src_h: u32, canvas: Canvas) -> (u32, u32, u32, u32) {
    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(canvas.width), u64::from(canvas.height));
    let (cw, ch) = if sw * th > tw * sh {
        // Source is wider: keep full height.
        (((sh * tw + th / 2) / th).clamp(1, sw), sh)
    } else {
        (sw, ((sw * th + tw / 2) / tw).clamp(1, sh))
    };
    let (cw, ch) = (cw as u32, ch as u32);
    ((src_w - cw) / 2, (src_h - ch) / 2, cw, ch)
}

fn cover_crop(src: &image::RgbaImage, canvas: Canvas) -> image::RgbaImage {
    let (x, y, w, h) = cover_rect(src.width(), src.height(), canvas);
    let cropped = imageops::crop_imm(src, x, y, w, h).to_image();
    if (w, h) == (canvas.width, canvas.height) {
        return cropped;
    }
    imageops::resize(&cropped, canvas.width, canvas.height, FilterType::Triangle)
}

fn flatten_over_black(img: &mut image::RgbaImage) {
    for px in img.pixels_mut() {
        let a = px.0[3];
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            px.0[c] = mul_div255_u8(u16::from(px.0[c]), u16::from(a));
        }
        px.0[3] = 255;
    }
}

/// `pixel = base*(1-alpha) + overlay*alpha` inside the overlay's bounding box.
fn blend_overlay(
    frame: &mut [u8],
    canvas: Canvas,
    overlay: &OverlayBitmap,
    bottom_margin: u32,
) -> AdreelResult<()> {
    if overlay.width == 0 || overlay.height == 0 {
        return Ok(());
    }
    let ov_px = (overlay.width as usize) * (overlay.height as usize);
    if overlay.pixels.len() != ov_px * 3 || overlay.alpha_mask.len() != ov_px {
        return Err(AdreelError::media_shape(format!(
            "overlay buffers do not match {}x{}",
            overlay.width, overlay.height
        )));
    }

    let fw = i64::from(canvas.width);
    let fh = i64::from(canvas.height);
    let ox = (fw - i64::from(overlay.width)) / 2;
    let oy = fh - i64::from(overlay.height) - i64::from(bottom_margin);

    for row in 0..i64::from(overlay.height) {
        let fy = oy + row;
        if !(0..fh).contains(&fy) {
            continue;
        }
        for col in 0..i64::from(overlay.width) {
            let fx = ox + col;
            if !(0..fw).contains(&fx) {
                continue;
            }
            let oi = (row * i64::from(overlay.width) + col) as usize;
            let a = overlay.alpha_mask[oi];
            if a == 0 {
                continue;
            }
            let fi = ((fy * fw + fx) as usize) * 4;
            for c in 0..3 {
                frame[fi + c] = blend_channel(frame[fi + c], overlay.pixels[oi * 3 + c], a);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
