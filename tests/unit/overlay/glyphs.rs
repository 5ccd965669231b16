use super::*;

#[test]
fn block_measure_is_char_count_times_advance() {
    let b = BlockGlyphs;
    assert_eq!(b.measure("abc", 10.0).unwrap(), 18.0);
    assert_eq!(b.measure("a b", 10.0).unwrap(), 18.0);
    assert_eq!(b.measure("", 10.0).unwrap(), 0.0);
}

#[test]
fn block_rasterize_inks_characters_but_not_spaces() {
    let b = BlockGlyphs;
    let line = PlacedLine {
        text: "a b".to_string(),
        width: 18.0,
        center_x: 10.0,
        baseline_y: 9.0,
    };
    let mask = b.rasterize(&[line], 20, 10, 10.0).unwrap();
    assert_eq!(mask.len(), 200);

    // Line starts at x=1; glyph ink is 5x7 ending at the baseline row 8.
    let at = |x: usize, y: usize| mask[y * 20 + x];
    assert_eq!(at(1, 2), 255);
    assert_eq!(at(5, 8), 255);
    assert_eq!(at(6, 5), 0);
    assert_eq!(at(8, 5), 0);
    assert_eq!(at(13, 5), 255);
    assert_eq!(at(1, 1), 0);
    assert_eq!(at(1, 9), 0);
}

#[test]
fn block_rasterize_clips_to_bounds() {
    let line = PlacedLine {
        text: "wwwwwwwwww".to_string(),
        width: 60.0,
        center_x: 5.0,
        baseline_y: 3.0,
    };
    let mask = BlockGlyphs.rasterize(&[line], 10, 4, 10.0).unwrap();
    assert_eq!(mask.len(), 40);
}

#[test]
fn empty_font_database_is_render_error() {
    let err = SvgText::with_database("sans-serif", usvg::fontdb::Database::new()).unwrap_err();
    assert_eq!(err.kind(), "render");
}

#[test]
fn xml_escaping() {
    assert_eq!(
        escape_xml(r#"50% <off> & "free" 'now'"#),
        "50% &lt;off&gt; &amp; &quot;free&quot; &apos;now&apos;"
    );
    assert_eq!(escape_xml("a\nb"), "a b");
}
