/// Lazy expansion of scene frames into the output frame stream.
pub mod sequencer;
