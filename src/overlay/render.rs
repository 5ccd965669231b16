use std::{
    collections::{BTreeSet, HashMap},
    path::PathBuf,
    sync::Arc,
};

use rayon::prelude::*;

use crate::{
    foundation::error::{AdreelError, AdreelResult},
    foundation::math::{Fnv1a64, mul_div255_u16, unit_to_u8},
    overlay::glyphs::{BlockGlyphs, GlyphBackend, PlacedLine, SvgText},
    overlay::wrap::wrap_words,
    scene::model::OverlayStyle,
};

/// A rendered caption banner with straight (non-premultiplied) color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayBitmap {
    /// Width in pixels (the target frame width).
    pub width: u32,
    /// Height in pixels; zero for blank captions.
    pub height: u32,
    /// RGB8 color, row-major, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    /// Per-pixel opacity, `width * height` bytes.
    pub alpha_mask: Vec<u8>,
}

impl OverlayBitmap {
    /// A zero-height overlay that composites as a no-op.
    pub fn empty(width: u32) -> Self {
        Self {
            width,
            height: 0,
            pixels: Vec::new(),
            alpha_mask: Vec::new(),
        }
    }

    /// Content hash over dimensions, color and alpha.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_bytes(&self.pixels);
        h.write_bytes(&self.alpha_mask);
        h.finish()
    }
}

/// Renders captions into [`OverlayBitmap`]s.
///
/// The renderer owns one text backend. When that backend fails for a caption, the caption
/// is rendered again with [`BlockGlyphs`]; overlays are never dropped.
#[derive(Clone)]
pub struct OverlayRenderer {
    backend: Arc<dyn GlyphBackend>,
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl OverlayRenderer {
    /// Use a specific backend.
    pub fn new(backend: Arc<dyn GlyphBackend>) -> Self {
        Self { backend }
    }

    /// Font-backed rendering when any font is available, block glyphs otherwise.
    pub fn from_style(style: &OverlayStyle) -> Self {
        match SvgText::new(&style.font_family, &style.font_dirs) {
            Ok(svg) => {
                tracing::debug!(faces = svg.face_count(), "caption fonts loaded");
                Self::new(Arc::new(svg))
            }
            Err(e) => {
                tracing::warn!(error = %e, "no usable caption font; using block glyphs");
                Self::block_glyphs()
            }
        }
    }

    /// Always render with block glyphs (deterministic across machines).
    pub fn block_glyphs() -> Self {
        Self::new(Arc::new(BlockGlyphs))
    }

    /// Name of the primary backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Render `caption` as a banner `target_width` pixels wide.
    pub fn render(&self, caption: &str, target_width: u32, style: &OverlayStyle) -> OverlayBitmap {
        match render_with(self.backend.as_ref(), caption, target_width, style) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "caption render failed; retrying with block glyphs"
                );
                render_with(&BlockGlyphs, caption, target_width, style).unwrap_or_else(|e| {
                    tracing::error!(error = %e, "block glyph render failed; caption left blank");
                    OverlayBitmap::empty(target_width)
                })
            }
        }
    }
}

/// Render with one backend, surfacing its failure as [`AdreelError::Render`].
pub fn render_with(
    backend: &dyn GlyphBackend,
    caption: &str,
    target_width: u32,
    style: &OverlayStyle,
) -> AdreelResult<OverlayBitmap> {
    if target_width == 0 {
        return Err(AdreelError::render("overlay target width must be non-zero"));
    }
    let size = style.font_size_px;
    let max_text_w = target_width
        .saturating_sub(style.padding_x.saturating_mul(2))
        .max(1) as f32;
    let lines = wrap_words(caption, max_text_w, |s| backend.measure(s, size))?;
    if lines.is_empty() {
        return Ok(OverlayBitmap::empty(target_width));
    }

    let line_h = style.line_height_px();
    let height = (lines.len() as u32)
        .checked_mul(line_h)
        .and_then(|h| h.checked_add(style.padding_y.saturating_mul(2)))
        .ok_or_else(|| AdreelError::render("overlay height overflow"))?;

    // Baseline sits ~80% of the em box down, with the em box centered in the line box.
    let center_x = target_width as f32 / 2.0;
    let mut placed = Vec::with_capacity(lines.len());
    let mut widest = 0.0f32;
    for (i, text) in lines.into_iter().enumerate() {
        let width = backend.measure(&text, size)?;
        widest = widest.max(width);
        let top = style.padding_y as f32 + (i as u32 * line_h) as f32;
        let baseline_y = (top + (line_h as f32 - size) / 2.0 + size * 0.8).round();
        placed.push(PlacedLine {
            text,
            width,
            center_x,
            baseline_y,
        });
    }

    let coverage = backend.rasterize(&placed, target_width, height, size)?;
    let px_count = (target_width as usize) * (height as usize);
    if coverage.len() != px_count {
        return Err(AdreelError::render(format!(
            "backend returned {} coverage values for {px_count} pixels",
            coverage.len()
        )));
    }

    let box_w = (widest.ceil() as u32)
        .saturating_add(style.padding_x.saturating_mul(2))
        .min(target_width);
    let box_x0 = (target_width - box_w) / 2;
    let box_x1 = box_x0 + box_w;
    let bg_a = unit_to_u8(style.background_alpha);

    let mut pixels = vec![0u8; px_count * 3];
    let mut alpha_mask = vec![0u8; px_count];
    for y in 0..height as usize {
        for x in 0..target_width as usize {
            let i = y * target_width as usize + x;
            let in_box = (box_x0 as usize..box_x1 as usize).contains(&x);
            let base_a = if in_box { bg_a } else { 0 };
            let (rgb, a) = text_over_background(
                style.text_rgb,
                coverage[i],
                style.background_rgb,
                base_a,
            );
            pixels[i * 3..i * 3 + 3].copy_from_slice(&rgb);
            alpha_mask[i] = a;
        }
    }

    Ok(OverlayBitmap {
        width: target_width,
        height,
        pixels,
        alpha_mask,
    })
}

/// Straight-alpha "over": text with coverage `ta` over a background with alpha `ba`.
fn text_over_background(text: [u8; 3], ta: u8, bg: [u8; 3], ba: u8) -> ([u8; 3], u8) {
    if ta == 0 {
        return (if ba == 0 { [0, 0, 0] } else { bg }, ba);
    }
    if ta == 255 || ba == 0 {
        return (text, ta.max(ba));
    }
    let ta16 = u16::from(ta);
    let bg_w = mul_div255_u16(u16::from(ba), 255 - ta16);
    let out_a = ta16 + bg_w;
    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let num = u32::from(text[c]) * u32::from(ta16) + u32::from(bg[c]) * u32::from(bg_w);
        rgb[c] = ((num + u32::from(out_a) / 2) / u32::from(out_a)).min(255) as u8;
    }
    (rgb, out_a.min(255) as u8)
}

/// Per-job cache of rendered overlays keyed by `(caption, width)`.
#[derive(Debug, Default)]
pub struct OverlayCache {
    entries: HashMap<(String, u32), Arc<OverlayBitmap>>,
}

impl OverlayCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every distinct caption not yet cached, in parallel.
    pub fn prepare<'a, I>(
        &mut self,
        renderer: &OverlayRenderer,
        captions: I,
        target_width: u32,
        style: &OverlayStyle,
    ) where
        I: IntoIterator<Item = &'a str>,
    {
        let missing: BTreeSet<&str> = captions
            .into_iter()
            .filter(|c| !self.entries.contains_key(&(c.to_string(), target_width)))
            .collect();
        let rendered: Vec<(String, OverlayBitmap)> = missing
            .into_par_iter()
            .map(|c| (c.to_string(), renderer.render(c, target_width, style)))
            .collect();
        for (caption, bitmap) in rendered {
            self.entries
                .insert((caption, target_width), Arc::new(bitmap));
        }
    }

    /// Fetch a cached overlay, rendering and caching it on a miss.
    pub fn get_or_render(
        &mut self,
        renderer: &OverlayRenderer,
        caption: &str,
        target_width: u32,
        style: &OverlayStyle,
    ) -> Arc<OverlayBitmap> {
        let key = (caption.to_string(), target_width);
        Arc::clone(
            self.entries
                .entry(key)
                .or_insert_with(|| Arc::new(renderer.render(caption, target_width, style))),
        )
    }

    /// Number of cached overlays.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extra font directories from the environment, used by the CLI.
pub fn font_dirs_from_env() -> Vec<PathBuf> {
    std::env::var_os("ADREEL_FONT_DIRS")
        .map(|v| std::env::split_paths(&v).collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/render.rs"]
mod tests;
