//! Job inputs: scene specs, style configuration, manifests and scripts.

/// JSON job manifests.
pub mod manifest;
/// Scene, style and transition configuration types.
pub mod model;
/// Timestamped ad script parsing.
pub mod script;
