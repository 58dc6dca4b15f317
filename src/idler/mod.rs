//! Idle-cycle logic: synthetic movement and the prompt loop that drives it.

pub mod mover;
pub mod orchestrator;
pub mod prompt;

pub use mover::*;
pub use orchestrator::*;
pub use prompt::*;
