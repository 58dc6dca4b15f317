//! Activity detection.
//!
//! This module contains the shared activity state, the input hook callback
//! and the supervisor that runs the hooks on their own thread.

pub mod activity;
pub mod input_hooks;
pub mod supervisor;

pub use activity::*;
pub use input_hooks::*;
pub use supervisor::*;
