/// Transition kinds and blend progress.
pub mod transitions;
