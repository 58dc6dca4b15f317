//! Hook callback logic for telling real users apart from the idler.
//!
//! # Performance Critical
//!
//! [`HookCallback::dispatch`] runs synchronously in the system input
//! pipeline. It must:
//! - Use only atomic operations (no locks)
//! - Never allocate on the hot path
//! - Never block
//! - Always forward to the next hook in the chain

use crate::backend::{HookKind, InputBackend};
use crate::error::NativeError;
use crate::monitor::activity::{ActivityClock, UserControlGate};
use std::sync::Arc;

// ============================================================================
// Native message ids
// ============================================================================

/// Hook code: the event carries input that should be processed.
pub const HC_ACTION: i32 = 0;

pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_SYSKEYUP: u32 = 0x0105;
pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_MOUSEWHEEL: u32 = 0x020A;

/// One invocation of a low-level hook procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookEvent {
    pub kind: HookKind,
    pub code: i32,
    /// Window message id carried in `wparam`.
    pub message: u32,
    pub wparam: usize,
    /// Pointer to the native hook struct. Never dereferenced by the core.
    pub lparam: isize,
}

impl HookEvent {
    /// Builds an actionable event for `message`.
    pub fn action(kind: HookKind, message: u32) -> Self {
        Self {
            kind,
            code: HC_ACTION,
            message,
            wparam: message as usize,
            lparam: 0,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.code == HC_ACTION
    }
}

/// Input kinds that count as the user taking control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    PrimaryButtonDown,
    SecondaryButtonDown,
    PointerMove,
    KeyDown,
    KeyUp,
    ModifierDown,
    ModifierUp,
}

impl UserInput {
    /// Classifies a window message. Anything else (wheel, button up, middle
    /// button) is not considered a takeover.
    pub fn from_message(message: u32) -> Option<Self> {
        match message {
            WM_LBUTTONDOWN => Some(Self::PrimaryButtonDown),
            WM_RBUTTONDOWN => Some(Self::SecondaryButtonDown),
            WM_MOUSEMOVE => Some(Self::PointerMove),
            WM_KEYDOWN => Some(Self::KeyDown),
            WM_KEYUP => Some(Self::KeyUp),
            WM_SYSKEYDOWN => Some(Self::ModifierDown),
            WM_SYSKEYUP => Some(Self::ModifierUp),
            _ => None,
        }
    }
}

// ============================================================================
// Hook Callback
// ============================================================================

/// State the hook procedure needs; one per supervisor run.
#[derive(Clone)]
pub struct HookCallback {
    clock: Arc<ActivityClock>,
    gate: Arc<UserControlGate>,
}

impl HookCallback {
    pub fn new(clock: Arc<ActivityClock>, gate: Arc<UserControlGate>) -> Self {
        Self { clock, gate }
    }

    /// Refreshes the activity clock if `event` is genuine user input.
    ///
    /// Returns whether the clock was touched. Events arriving while the
    /// idler holds the gate are treated as its own.
    #[inline]
    pub fn observe(&self, event: &HookEvent) -> bool {
        if !event.is_actionable() || self.gate.is_idler_driving() {
            return false;
        }
        match UserInput::from_message(event.message) {
            Some(input) => {
                self.clock.touch();
                tracing::trace!(?input, "User input");
                true
            }
            None => false,
        }
    }

    /// Full hook procedure: observe, then forward to the next hook.
    ///
    /// A stale-handle error from the chain is logged and answered with `0`.
    /// Every other native error is returned to the caller as fatal.
    pub fn dispatch<B: InputBackend + ?Sized>(
        &self,
        backend: &B,
        event: &HookEvent,
    ) -> Result<isize, NativeError> {
        self.observe(event);

        match backend.call_next_hook(event) {
            Ok(result) => Ok(result),
            Err(e) if e.is_stale_handle() => {
                tracing::error!(error = %e, hook_type = event.kind.as_str(), "Ignored stale hook error");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}
