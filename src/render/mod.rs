//! Frame construction and pixel compositing.

/// Pixel blends used by transitions.
pub mod composite;
/// Scene frame building (cover crop plus overlay).
pub mod frame;
