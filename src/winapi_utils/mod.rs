//! Win32 implementation of the native input backend.
//!
//! This module provides safe Rust abstractions over the unsafe WinAPI calls
//! the idler needs: low-level hooks, the message loop, cursor I/O and the
//! modal prompt.

pub mod cursor;
pub mod hooks;
pub mod message_loop;
pub mod window;

pub use cursor::*;
pub use hooks::*;
pub use message_loop::*;
pub use window::*;

use crate::backend::{HookKind, HookProc, InputBackend, Point, ThreadId, Unhooked};
use crate::error::NativeError;
use crate::idler::prompt::{Prompt, PromptChoice};
use crate::monitor::input_hooks::HookEvent;
use once_cell::sync::Lazy;
use std::sync::Arc;
use windows::Win32::Foundation::{LPARAM, WPARAM};

/// Process-wide Win32 backend.
pub static WIN32_INPUT: Lazy<Arc<Win32Input>> = Lazy::new(|| Arc::new(Win32Input));

/// Converts a `windows` error, recovering the Win32 code from its HRESULT.
fn native(operation: &'static str, e: windows::core::Error) -> NativeError {
    let hr = e.code().0 as u32;
    let code = if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    };
    NativeError::new(operation, code, e.message().to_string())
}

/// [`InputBackend`] backed by user32.
#[derive(Debug, Default)]
pub struct Win32Input;

impl InputBackend for Win32Input {
    type Hook = HookGuard;

    fn prepare_thread(&self) -> Result<ThreadId, NativeError> {
        Ok(prepare_message_queue())
    }

    fn register_hook(&self, kind: HookKind, proc: HookProc) -> Result<HookGuard, NativeError> {
        HookGuard::install(kind, proc).map_err(|e| native("SetWindowsHookExW", e))
    }

    fn unregister_hook(&self, hook: HookGuard) -> Result<Unhooked, NativeError> {
        hook.unhook().map_err(|e| native("UnhookWindowsHookEx", e))
    }

    fn run_message_loop(&self) -> Result<(), NativeError> {
        message_loop::run_message_loop().map_err(|e| native("GetMessageW", e))
    }

    fn post_quit(&self, thread: ThreadId) -> Result<(), NativeError> {
        post_quit_message(thread).map_err(|e| native("PostThreadMessageW", e))
    }

    fn call_next_hook(&self, event: &HookEvent) -> Result<isize, NativeError> {
        Ok(call_next_hook(event.code, WPARAM(event.wparam), LPARAM(event.lparam)).0)
    }

    fn cursor_position(&self) -> Result<Point, NativeError> {
        get_cursor_position().map_err(|e| native("GetCursorPos", e))
    }

    fn set_cursor_position(&self, point: Point) -> Result<(), NativeError> {
        cursor::set_cursor_position(point).map_err(|e| native("SetCursorPos", e))
    }

    fn show_prompt(&self, prompt: &Prompt) -> Result<PromptChoice, NativeError> {
        show_message_box(prompt)
            .map(PromptChoice::from_id)
            .map_err(|e| native("MessageBoxW", e))
    }
}
