//! Windows hook installation and management.
//!
//! Low-level hook procedures receive no user data, so each hook class gets a
//! fixed `extern "system"` trampoline that forwards into a closure stored in
//! a thread-local slot on the installing thread. The closure lives exactly as
//! long as the hook: it is stored before `SetWindowsHookExW` and dropped by
//! [`HookGuard::unhook`].

use crate::backend::{HookKind, HookProc, Unhooked};
use crate::monitor::input_hooks::HookEvent;
use std::cell::RefCell;
use windows::Win32::Foundation::{ERROR_INVALID_HOOK_HANDLE, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL,
    WH_MOUSE_LL,
};

thread_local! {
    /// Hook closures of the current thread, indexed by [`slot`].
    static HOOK_PROCS: RefCell<[Option<HookProc>; 2]> = const { RefCell::new([None, None]) };
}

fn slot(kind: HookKind) -> usize {
    match kind {
        HookKind::Pointer => 0,
        HookKind::Keyboard => 1,
    }
}

/// Owned registration of a low-level hook.
///
/// Unhooks on drop if [`HookGuard::unhook`] was never called, so a panic on
/// the worker thread cannot leak a system-wide hook.
pub struct HookGuard {
    handle: Option<HHOOK>,
    kind: HookKind,
}

impl HookGuard {
    /// Installs a low-level hook for `kind` on the calling thread.
    ///
    /// # Important
    /// - `proc` must be extremely fast (< 1ms)
    /// - The installing thread must run a message pump
    /// - Only the installing thread may unhook
    pub fn install(kind: HookKind, proc: HookProc) -> windows::core::Result<Self> {
        HOOK_PROCS.with(|procs| procs.borrow_mut()[slot(kind)] = Some(proc));

        let hook_id = match kind {
            HookKind::Pointer => WH_MOUSE_LL,
            HookKind::Keyboard => WH_KEYBOARD_LL,
        };
        let callback: HOOKPROC = match kind {
            HookKind::Pointer => Some(mouse_hook_proc),
            HookKind::Keyboard => Some(keyboard_hook_proc),
        };
        match unsafe { SetWindowsHookExW(hook_id, callback, None, 0) } {
            Ok(handle) => Ok(Self {
                handle: Some(handle),
                kind,
            }),
            Err(e) => {
                clear_slot(kind);
                Err(e)
            }
        }
    }

    /// Removes the hook and drops its closure.
    pub fn unhook(mut self) -> windows::core::Result<Unhooked> {
        match self.handle.take() {
            Some(handle) => unhook_handle(handle, self.kind),
            None => Ok(Unhooked::AlreadyInvalid),
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = unhook_handle(handle, self.kind) {
                tracing::error!(hook_type = self.kind.as_str(), error = ?e, "Failed to unhook");
            }
        }
    }
}

fn unhook_handle(handle: HHOOK, kind: HookKind) -> windows::core::Result<Unhooked> {
    let result = unsafe { UnhookWindowsHookEx(handle) };
    clear_slot(kind);
    match result {
        Ok(()) => Ok(Unhooked::Removed),
        Err(e) if e.code() == ERROR_INVALID_HOOK_HANDLE.to_hresult() => Ok(Unhooked::AlreadyInvalid),
        Err(e) => Err(e),
    }
}

fn clear_slot(kind: HookKind) {
    // Take the closure out before dropping it so the borrow is released first.
    let proc = HOOK_PROCS.with(|procs| procs.borrow_mut()[slot(kind)].take());
    drop(proc);
}

/// Calls the next hook in the hook chain.
///
/// This must be called at the end of every hook callback to ensure
/// other hooks receive the event. Failure to call this breaks the
/// hook chain for all applications.
#[inline(always)]
pub fn call_next_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

// ============================================================================
// Trampolines
// ============================================================================

unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    dispatch(HookKind::Pointer, code, wparam, lparam)
}

unsafe extern "system" fn keyboard_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    dispatch(HookKind::Keyboard, code, wparam, lparam)
}

fn dispatch(kind: HookKind, code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let event = HookEvent {
        kind,
        code,
        message: wparam.0 as u32,
        wparam: wparam.0,
        lparam: lparam.0,
    };
    let handled = HOOK_PROCS.with(|procs| {
        let mut procs = procs.try_borrow_mut().ok()?;
        let proc = procs[slot(kind)].as_mut()?;
        Some(proc(&event))
    });

    match handled {
        Some(result) => LRESULT(result),
        // No closure (or re-entered): still keep the chain intact.
        None => call_next_hook(code, wparam, lparam),
    }
}
