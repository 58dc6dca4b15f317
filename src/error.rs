//! Error types shared by the supervisor, mover and orchestrator.

/// Native error code reported when a hook handle went stale underneath us.
///
/// Only observed with a debugger attached to the process, presumably because
/// the debugger suspends the hook thread long enough for the system to
/// invalidate the chain. Nothing else is treated as recoverable inside the
/// hook callback.
pub const STALE_HOOK_ERROR: u32 = 127;

/// Error code for an `unregister` on a handle the system already dropped.
pub const INVALID_HOOK_HANDLE: u32 = 1404;

/// A failure reported by the native input subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed with code {code}: {message}")]
pub struct NativeError {
    /// Which native operation failed (e.g. `"SetWindowsHookExW"`).
    pub operation: &'static str,
    /// Platform error code (`GetLastError` style).
    pub code: u32,
    /// Human readable description.
    pub message: String,
}

impl NativeError {
    pub fn new(operation: &'static str, code: u32, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Whether this is the debugger-induced stale handle error.
    pub fn is_stale_handle(&self) -> bool {
        self.code == STALE_HOOK_ERROR
    }
}

/// Top level error for the idler.
#[derive(Debug, thiserror::Error)]
pub enum IdleError {
    #[error("native input call failed: {0}")]
    Native(#[from] NativeError),

    #[error("cannot stop hook before starting it")]
    NotStarted,

    #[error("hook supervisor is already running")]
    AlreadyStarted,

    #[error("hook worker thread exited without being asked to stop")]
    WorkerExited,

    #[error("hook worker thread panicked")]
    WorkerPanicked,

    #[error("prompt thread panicked")]
    PromptPanicked,

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = IdleError> = std::result::Result<T, E>;
