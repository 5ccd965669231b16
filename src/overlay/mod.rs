//! Caption banners: word wrapping, glyph backends and bitmap rendering.

/// Text measurement and rasterization backends.
pub mod glyphs;
/// Caption banner rendering and the per-job overlay cache.
pub mod render;
/// Greedy word wrapping.
pub mod wrap;
