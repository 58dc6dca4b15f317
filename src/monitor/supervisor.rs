//! Hook lifecycle on a dedicated worker thread.
//!
//! Low-level hooks are bound to the thread that installs them: that thread
//! must pump messages for the hooks to fire, and only that thread may remove
//! them. [`HookSupervisor`] therefore never touches a hook handle itself. It
//! spawns a worker that registers both hooks, runs the message loop and
//! unregisters on the way out; `stop()` only posts a quit message to the
//! worker and joins it.

use crate::backend::{HookKind, HookProc, InputBackend, ThreadId, Unhooked};
use crate::error::{IdleError, NativeError, Result};
use crate::monitor::activity::{ActivityClock, UserControlGate};
use crate::monitor::input_hooks::{HookCallback, HookEvent};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Lifecycle state of a [`HookSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
}

struct Worker {
    thread_id: ThreadId,
    handle: JoinHandle<Result<()>>,
}

/// Owns the hook worker thread for one idle cycle at a time.
pub struct HookSupervisor<B: InputBackend> {
    backend: Arc<B>,
    clock: Arc<ActivityClock>,
    gate: Arc<UserControlGate>,
    state: SupervisorState,
    worker: Option<Worker>,
}

impl<B: InputBackend> HookSupervisor<B> {
    pub fn new(backend: Arc<B>, clock: Arc<ActivityClock>, gate: Arc<UserControlGate>) -> Self {
        Self {
            backend,
            clock,
            gate,
            state: SupervisorState::Idle,
            worker: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// OS id of the worker thread while running.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.worker.as_ref().map(|w| w.thread_id)
    }

    /// Spawns the worker and waits until both hooks are installed.
    ///
    /// Fails with [`IdleError::AlreadyStarted`] if a worker is still running.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(IdleError::AlreadyStarted);
        }
        self.state = SupervisorState::Starting;

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let backend = Arc::clone(&self.backend);
        let callback = HookCallback::new(Arc::clone(&self.clock), Arc::clone(&self.gate));

        let spawned = thread::Builder::new()
            .name("idler-hooks".into())
            .spawn(move || run_worker(backend, callback, ready_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state = SupervisorState::Idle;
                return Err(e.into());
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                tracing::info!(thread_id, "Hook supervisor running");
                self.worker = Some(Worker { thread_id, handle });
                self.state = SupervisorState::Running;
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = SupervisorState::Idle;
                // The worker has already cleaned up and is returning.
                let _ = handle.join();
                Err(e.into())
            }
            Err(_) => {
                self.state = SupervisorState::Idle;
                Err(joined_early(handle))
            }
        }
    }

    /// Signals the worker to quit and waits for it to unhook and exit.
    ///
    /// Fails with [`IdleError::NotStarted`] if nothing is running. Any fatal
    /// error the worker hit while running is returned here.
    pub fn stop(&mut self) -> Result<()> {
        let Some(thread_id) = self.thread_id() else {
            return Err(IdleError::NotStarted);
        };
        self.state = SupervisorState::Stopping;
        tracing::info!(thread_id, "Stopping hook thread");

        if let Err(e) = self.backend.post_quit(thread_id) {
            let alive = self
                .worker
                .as_ref()
                .is_some_and(|w| !w.handle.is_finished());
            if alive {
                // The worker still owns both hooks; keep it so stop() can be retried.
                self.state = SupervisorState::Running;
                tracing::error!(error = %e, "Failed to signal hook thread");
                return Err(e.into());
            }
        }

        let Some(worker) = self.worker.take() else {
            return Err(IdleError::NotStarted);
        };
        let result = match worker.handle.join() {
            Ok(result) => result,
            Err(_) => Err(IdleError::WorkerPanicked),
        };
        self.state = SupervisorState::Idle;
        result
    }

    /// Surfaces a worker that died on its own.
    ///
    /// Returns `Ok(())` while the worker is alive (or when nothing runs).
    /// Once it has exited, joins it, returns to idle and reports why.
    pub fn check_worker(&mut self) -> Result<()> {
        let finished = self
            .worker
            .as_ref()
            .is_some_and(|w| w.handle.is_finished());
        if !finished {
            return Ok(());
        }
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.state = SupervisorState::Idle;
        tracing::error!(thread_id = worker.thread_id, "Hook thread exited unexpectedly");
        Err(joined_early(worker.handle))
    }

    /// Starts the supervisor and returns a guard that stops it on every exit path.
    pub fn session(&mut self) -> Result<HookSession<'_, B>> {
        self.start()?;
        Ok(HookSession { supervisor: self })
    }
}

impl<B: InputBackend> Drop for HookSupervisor<B> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                tracing::error!(error = %e, "Hook supervisor failed to stop on drop");
            }
        }
    }
}

/// Scoped run of a [`HookSupervisor`].
///
/// Stops the supervisor exactly once: through [`HookSession::finish`] when
/// the caller wants the result, or on drop otherwise.
pub struct HookSession<'a, B: InputBackend> {
    supervisor: &'a mut HookSupervisor<B>,
}

impl<B: InputBackend> HookSession<'_, B> {
    pub fn check_worker(&mut self) -> Result<()> {
        self.supervisor.check_worker()
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        self.supervisor.thread_id()
    }

    /// Stops the supervisor and returns the worker's result.
    pub fn finish(self) -> Result<()> {
        if self.supervisor.is_running() {
            self.supervisor.stop()
        } else {
            Ok(())
        }
    }
}

impl<B: InputBackend> Drop for HookSession<'_, B> {
    fn drop(&mut self) {
        if self.supervisor.is_running() {
            if let Err(e) = self.supervisor.stop() {
                tracing::error!(error = %e, "Hook session teardown failed");
            }
        }
    }
}

/// Turns an exited worker's join result into the error that ended it.
fn joined_early(handle: JoinHandle<Result<()>>) -> IdleError {
    match handle.join() {
        Ok(Ok(())) => IdleError::WorkerExited,
        Ok(Err(e)) => e,
        Err(_) => IdleError::WorkerPanicked,
    }
}

// ============================================================================
// Worker thread
// ============================================================================

type FaultSlot = Rc<RefCell<Option<NativeError>>>;

fn run_worker<B: InputBackend>(
    backend: Arc<B>,
    callback: HookCallback,
    ready: SyncSender<std::result::Result<ThreadId, NativeError>>,
) -> Result<()> {
    let thread_id = match backend.prepare_thread() {
        Ok(id) => id,
        Err(e) => {
            let _ = ready.send(Err(e));
            return Ok(());
        }
    };
    tracing::info!(thread_id, "Starting hooks on thread");

    let fault: FaultSlot = Rc::default();
    let hooks = match install_hooks(&backend, &callback, thread_id, &fault) {
        Ok(hooks) => hooks,
        Err(e) => {
            let _ = ready.send(Err(e));
            return Ok(());
        }
    };
    let _ = ready.send(Ok(thread_id));

    let looped = backend.run_message_loop();
    let unhooked = uninstall_hooks(&*backend, hooks);
    tracing::info!(thread_id, "Hooks ended");

    if let Some(e) = fault.borrow_mut().take() {
        return Err(e.into());
    }
    looped?;
    unhooked?;
    Ok(())
}

fn install_hooks<B: InputBackend>(
    backend: &Arc<B>,
    callback: &HookCallback,
    thread_id: ThreadId,
    fault: &FaultSlot,
) -> std::result::Result<Vec<(HookKind, B::Hook)>, NativeError> {
    let mut hooks = Vec::with_capacity(2);
    for kind in [HookKind::Pointer, HookKind::Keyboard] {
        let proc = hook_proc(Arc::clone(backend), callback.clone(), thread_id, Rc::clone(fault));
        match backend.register_hook(kind, proc) {
            Ok(hook) => {
                tracing::info!(hook_type = kind.as_str(), "Hook installed successfully");
                hooks.push((kind, hook));
            }
            Err(e) => {
                tracing::error!(hook_type = kind.as_str(), error = %e, "Failed to install hook");
                let _ = uninstall_hooks(&**backend, hooks);
                return Err(e);
            }
        }
    }
    Ok(hooks)
}

/// Unregisters every hook, reporting the first hard failure.
fn uninstall_hooks<B: InputBackend>(
    backend: &B,
    hooks: Vec<(HookKind, B::Hook)>,
) -> std::result::Result<(), NativeError> {
    let mut first_error = None;
    for (kind, hook) in hooks {
        match backend.unregister_hook(hook) {
            Ok(Unhooked::Removed) => {
                tracing::info!(hook_type = kind.as_str(), "Hook uninstalled successfully")
            }
            Ok(Unhooked::AlreadyInvalid) => {
                tracing::warn!(hook_type = kind.as_str(), "Hook handle was already invalid")
            }
            Err(e) => {
                tracing::error!(hook_type = kind.as_str(), error = %e, "Failed to unhook");
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Wraps the callback for the backend. A fatal error is parked in `fault`
/// and ends the message loop; the event itself gets a neutral `0`.
fn hook_proc<B: InputBackend>(
    backend: Arc<B>,
    callback: HookCallback,
    thread_id: ThreadId,
    fault: FaultSlot,
) -> HookProc {
    Box::new(move |event: &HookEvent| match callback.dispatch(&*backend, event) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, hook_type = event.kind.as_str(), "Fatal error in hook callback");
            let mut slot = fault.borrow_mut();
            if slot.is_none() {
                *slot = Some(e);
                if let Err(post) = backend.post_quit(thread_id) {
                    tracing::error!(error = %post, "Failed to end hook thread after fault");
                }
            }
            0
        }
    })
}
