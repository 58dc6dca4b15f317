//! Seam between the idler core and the native input subsystem.
//!
//! Everything the core needs from the operating system goes through
//! [`InputBackend`]. On Windows this is [`crate::winapi_utils::Win32Input`];
//! tests drive the core with an in-process fake.

use crate::error::NativeError;
use crate::idler::prompt::{Prompt, PromptChoice};
use crate::monitor::input_hooks::HookEvent;

/// OS thread identifier, as accepted by the quit signal.
pub type ThreadId = u32;

/// Hook callback installed on the worker thread.
///
/// Receives every event of its hook class and returns the value the hook
/// procedure must hand back to the system. Never crosses threads.
pub type HookProc = Box<dyn FnMut(&HookEvent) -> isize>;

/// Class of low-level hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Pointer,
    Keyboard,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Pointer => "mouse_ll",
            HookKind::Keyboard => "keyboard_ll",
        }
    }
}

/// Screen position in integral pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Result of unregistering a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unhooked {
    Removed,
    /// The system had already dropped the handle.
    AlreadyInvalid,
}

/// Native input capabilities used by the idler.
///
/// Implementations are process-wide service objects shared behind an `Arc`.
/// Hook registration, the message loop and unregistration are always called
/// from the same worker thread, which is why [`InputBackend::Hook`] carries no
/// `Send` bound.
pub trait InputBackend: Send + Sync + 'static {
    /// Opaque hook registration token.
    type Hook;

    /// Readies the calling thread to receive posted messages and returns its id.
    fn prepare_thread(&self) -> Result<ThreadId, NativeError>;

    /// Installs a low-level hook on the calling thread.
    fn register_hook(&self, kind: HookKind, proc: HookProc) -> Result<Self::Hook, NativeError>;

    /// Removes a hook. Must run on the thread that registered it.
    fn unregister_hook(&self, hook: Self::Hook) -> Result<Unhooked, NativeError>;

    /// Pumps messages on the calling thread until a quit message arrives.
    fn run_message_loop(&self) -> Result<(), NativeError>;

    /// Posts a quit message to the given thread. Callable from any thread.
    fn post_quit(&self, thread: ThreadId) -> Result<(), NativeError>;

    /// Forwards an event to the next hook in the chain.
    fn call_next_hook(&self, event: &HookEvent) -> Result<isize, NativeError>;

    fn cursor_position(&self) -> Result<Point, NativeError>;

    fn set_cursor_position(&self, point: Point) -> Result<(), NativeError>;

    /// Shows a modal prompt and blocks until the user answers it.
    fn show_prompt(&self, prompt: &Prompt) -> Result<PromptChoice, NativeError>;
}
