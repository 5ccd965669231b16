//! Encoding sinks and the encoder adapter.
//!
//! The adapter drains a frame stream into a [`sink::FrameSink`], staging output in the job
//! directory and publishing it only after a clean close.

/// Frame stream draining, staging and publication.
pub mod adapter;
/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
