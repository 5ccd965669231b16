//! Job orchestration: fetch, render, build, sequence, encode.

/// Cooperative cancellation.
pub mod cancel;
/// Scene-level progress reporting.
pub mod progress;
/// The end-to-end job.
pub mod video_job;
