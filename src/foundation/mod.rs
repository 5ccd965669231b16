/// Frame indices, frame rates and canvas sizes.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
