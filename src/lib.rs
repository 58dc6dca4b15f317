//! Mouse idler: keeps a session awake by nudging the cursor while nobody is
//! using it, and backs off as soon as a real user touches mouse or keyboard.

pub mod backend;
pub mod config;
pub mod error;
pub mod idler;
pub mod monitor;
#[cfg(windows)]
pub mod winapi_utils;

#[cfg(test)]
mod testing;
