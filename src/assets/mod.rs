//! Image retrieval and decoding.

/// In-memory decoding and the fallback image.
pub mod decode;
/// Local and remote image retrieval with a bounded worker pool.
pub mod fetch;
