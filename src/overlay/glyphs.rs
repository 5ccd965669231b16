use std::{path::Path, sync::Arc};

use crate::foundation::error::{AdreelError, AdreelResult};

/// One wrapped caption line positioned inside the overlay bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    /// Line text (single spaces between words).
    pub text: String,
    /// Measured advance width in pixels.
    pub width: f32,
    /// Horizontal center of the line.
    pub center_x: f32,
    /// Alphabetic baseline.
    pub baseline_y: f32,
}

/// A text backend: measures strings and rasterizes placed lines into a coverage mask.
pub trait GlyphBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Advance width of `text` at `font_size_px`.
    fn measure(&self, text: &str, font_size_px: f32) -> AdreelResult<f32>;

    /// Rasterize `lines` into a `width * height` coverage mask (0 = none, 255 = full ink).
    fn rasterize(
        &self,
        lines: &[PlacedLine],
        width: u32,
        height: u32,
        font_size_px: f32,
    ) -> AdreelResult<Vec<u8>>;
}

/// Minimal backend that draws every visible character as a solid block.
///
/// Used when no font is available, so captions are always legible as "something" and the
/// overlay is never dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockGlyphs;

impl BlockGlyphs {
    const ADVANCE: f32 = 0.6;
    const INK_W: f32 = 0.5;
    const INK_H: f32 = 0.7;
}

impl GlyphBackend for BlockGlyphs {
    fn name(&self) -> &'static str {
        "block"
    }

    fn measure(&self, text: &str, font_size_px: f32) -> AdreelResult<f32> {
        Ok(text.chars().count() as f32 * (font_size_px * Self::ADVANCE).round())
    }

    fn rasterize(
        &self,
        lines: &[PlacedLine],
        width: u32,
        height: u32,
        font_size_px: f32,
    ) -> AdreelResult<Vec<u8>> {
        let mut mask = vec![0u8; (width as usize) * (height as usize)];
        let advance = (font_size_px * Self::ADVANCE).round();
        let ink_w = (font_size_px * Self::INK_W).round().max(1.0) as i64;
        let ink_h = (font_size_px * Self::INK_H).round().max(1.0) as i64;

        for line in lines {
            let left = (line.center_x - line.width / 2.0).round() as i64;
            let bottom = line.baseline_y.round() as i64;
            for (i, ch) in line.text.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x0 = left + (i as f32 * advance) as i64;
                fill_rect(&mut mask, width, height, x0, bottom - ink_h, ink_w, ink_h);
            }
        }
        Ok(mask)
    }
}

fn fill_rect(mask: &mut [u8], width: u32, height: u32, x0: i64, y0: i64, w: i64, h: i64) {
    let x_start = x0.max(0);
    let x_end = (x0 + w).min(i64::from(width));
    let y_start = y0.max(0);
    let y_end = (y0 + h).min(i64::from(height));
    for y in y_start..y_end {
        let row = (y as usize) * (width as usize);
        for x in x_start..x_end {
            mask[row + x as usize] = 255;
        }
    }
}

/// Font-backed text via `usvg` text layout and `resvg` rasterization.
#[derive(Clone)]
pub struct SvgText {
    fontdb: Arc<usvg::fontdb::Database>,
    family: String,
}

impl std::fmt::Debug for SvgText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgText")
            .field("faces", &self.fontdb.len())
            .field("family", &self.family)
            .finish()
    }
}

impl SvgText {
    /// Load system fonts plus every font file found in `font_dirs`.
    ///
    /// Fails with [`AdreelError::Render`] when the resulting database holds no faces or the
    /// requested family produces no glyphs.
    pub fn new(family: &str, font_dirs: &[impl AsRef<Path>]) -> AdreelResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir.as_ref());
        }
        Self::with_database(family, db)
    }

    /// Use an already populated font database.
    pub fn with_database(family: &str, db: usvg::fontdb::Database) -> AdreelResult<Self> {
        if db.is_empty() {
            return Err(AdreelError::render("font database holds no faces"));
        }
        let backend = Self {
            fontdb: Arc::new(db),
            family: family.to_string(),
        };
        if backend.measure("Hg", 32.0)? <= 0.0 {
            return Err(AdreelError::render(format!(
                "font family '{family}' produced no glyphs"
            )));
        }
        Ok(backend)
    }

    /// Number of faces available to this backend.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    fn parse(&self, svg: &str) -> AdreelResult<usvg::Tree> {
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| AdreelError::render(format!("parse caption svg: {e}")))
    }

    fn text_element(&self, text: &str, x: f32, y: f32, size: f32, anchor: &str) -> String {
        format!(
            r##"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" text-anchor="{anchor}" fill="#ffffff" xml:space="preserve">{text}</text>"##,
            family = escape_xml(&self.family),
            text = escape_xml(text),
        )
    }
}

impl GlyphBackend for SvgText {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn measure(&self, text: &str, font_size_px: f32) -> AdreelResult<f32> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }
        let h = (font_size_px * 2.0).ceil();
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="{h}">{}</svg>"#,
            self.text_element(text, 0.0, font_size_px, font_size_px, "start")
        );
        let tree = self.parse(&svg)?;
        Ok(widest_text(tree.root()))
    }

    fn rasterize(
        &self,
        lines: &[PlacedLine],
        width: u32,
        height: u32,
        font_size_px: f32,
    ) -> AdreelResult<Vec<u8>> {
        let mut body = String::new();
        for line in lines {
            body.push_str(&self.text_element(
                &line.text,
                line.center_x,
                line.baseline_y,
                font_size_px,
                "middle",
            ));
        }
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">{body}</svg>"#
        );
        let tree = self.parse(&svg)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| AdreelError::render("failed to allocate caption pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.data().chunks_exact(4).map(|px| px[3]).collect())
    }
}

fn widest_text(group: &usvg::Group) -> f32 {
    let mut widest = 0.0f32;
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => widest = widest.max(widest_text(g.as_ref())),
            usvg::Node::Text(t) => widest = widest.max(t.bounding_box().width()),
            usvg::Node::Path(_) | usvg::Node::Image(_) => {}
        }
    }
    widest
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "font dir not readable; skipping");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to load font file");
        }
    }
}

/// Resolve the requested family, then generic families, then any face at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                ..Default::default()
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/glyphs.rs"]
mod tests;
