use super::*;

fn style() -> OverlayStyle {
    OverlayStyle {
        font_size_px: 10.0,
        line_height: 1.5,
        padding_x: 4,
        padding_y: 3,
        ..OverlayStyle::default()
    }
}

struct Broken;

impl GlyphBackend for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn measure(&self, _text: &str, _font_size_px: f32) -> AdreelResult<f32> {
        Err(AdreelError::render("no glyphs"))
    }

    fn rasterize(&self, _: &[PlacedLine], _: u32, _: u32, _: f32) -> AdreelResult<Vec<u8>> {
        Err(AdreelError::render("no glyphs"))
    }
}

#[test]
fn height_is_lines_times_line_height_plus_padding() {
    let r = OverlayRenderer::block_glyphs();
    let s = style();
    // advance 6px per char; text area is 100 - 8 = 92px => 15 chars per line.
    let one = r.render("hello", 100, &s);
    assert_eq!(one.width, 100);
    assert_eq!(one.height, 15 + 6);

    let three = r.render("aaaaaaaaaa bbbbbbbbbb cccccccccc", 100, &s);
    assert_eq!(three.height, 3 * 15 + 6);
    assert_eq!(three.pixels.len(), 100 * 51 * 3);
    assert_eq!(three.alpha_mask.len(), 100 * 51);
}

#[test]
fn blank_caption_is_zero_height() {
    let r = OverlayRenderer::block_glyphs();
    let bmp = r.render("  \n ", 64, &style());
    assert_eq!(bmp.height, 0);
    assert!(bmp.pixels.is_empty());
    assert!(bmp.alpha_mask.is_empty());
}

#[test]
fn background_box_is_centered_and_translucent() {
    let r = OverlayRenderer::block_glyphs();
    let s = style();
    // "ab" is 12px wide, box is 12 + 8 = 20px, centered in 100px => x in 40..60.
    let bmp = r.render("ab", 100, &s);
    let a = |x: usize, y: usize| bmp.alpha_mask[y * 100 + x];
    let bg = unit_to_u8(s.background_alpha);
    assert_eq!(a(0, 0), 0);
    assert_eq!(a(39, 0), 0);
    assert_eq!(a(40, 0), bg);
    assert_eq!(a(59, 0), bg);
    assert_eq!(a(60, 0), 0);

    // Text ink is opaque and uses the text color.
    let ink_row = bmp.height as usize / 2;
    let ink_x = 45;
    assert_eq!(a(ink_x, ink_row), 255);
    let i = (ink_row * 100 + ink_x) * 3;
    assert_eq!(&bmp.pixels[i..i + 3], &s.text_rgb);
}

#[test]
fn rendering_is_deterministic() {
    let r = OverlayRenderer::block_glyphs();
    let s = style();
    let a = r.render("Free shipping this week", 120, &s);
    let b = r.render("Free shipping this week", 120, &s);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(
        a.fingerprint(),
        r.render("Free shipping", 120, &s).fingerprint()
    );
}

#[test]
fn failing_backend_falls_back_to_block_glyphs() {
    let r = OverlayRenderer::new(Arc::new(Broken));
    let s = style();
    let bmp = r.render("still shown", 100, &s);
    let expected = OverlayRenderer::block_glyphs().render("still shown", 100, &s);
    assert_eq!(bmp, expected);
    assert!(bmp.height > 0);
}

#[test]
fn render_with_surfaces_backend_errors() {
    let err = render_with(&Broken, "x", 100, &style()).unwrap_err();
    assert_eq!(err.kind(), "render");
}

#[test]
fn text_over_partial_background_blends() {
    let (rgb, a) = text_over_background([255, 255, 255], 128, [0, 0, 0], 153);
    assert!(a > 153 && a < 255);
    assert!(rgb[0] > 128);
    assert_eq!(text_over_background([1, 2, 3], 0, [9, 9, 9], 0), ([0, 0, 0], 0));
    assert_eq!(text_over_background([1, 2, 3], 255, [9, 9, 9], 100), ([1, 2, 3], 255));
}

#[test]
fn cache_renders_each_distinct_caption_once() {
    let r = OverlayRenderer::block_glyphs();
    let s = style();
    let mut cache = OverlayCache::new();
    cache.prepare(&r, ["a", "b", "a"], 80, &s);
    assert_eq!(cache.len(), 2);

    let first = cache.get_or_render(&r, "a", 80, &s);
    let again = cache.get_or_render(&r, "a", 80, &s);
    assert!(Arc::ptr_eq(&first, &again));

    cache.get_or_render(&r, "a", 96, &s);
    assert_eq!(cache.len(), 3);
}

#[test]
fn oversized_padding_does_not_overflow() {
    let wide = OverlayStyle {
        padding_x: u32::MAX,
        ..style()
    };
    let bitmap = render_with(&BlockGlyphs, "Buy now", 40, &wide).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (40, 2 * 15 + 6));
    assert_eq!(bitmap.alpha_mask[0], 153);

    let tall = OverlayStyle {
        padding_y: u32::MAX,
        ..style()
    };
    let err = render_with(&BlockGlyphs, "Buy now", 40, &tall).unwrap_err();
    assert_eq!(err.kind(), "render");
    assert_eq!(
        OverlayRenderer::block_glyphs().render("Buy now", 40, &tall),
        OverlayBitmap::empty(40)
    );
}
