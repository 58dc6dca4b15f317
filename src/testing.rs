//! In-process stand-in for the native input subsystem.
//!
//! Each thread that calls `prepare_thread` gets a message queue backed by an
//! mpsc channel. Hook procedures live in a thread-local table, so, as on the
//! real system, only the registering thread can run or remove them.

use crate::backend::{HookKind, HookProc, InputBackend, Point, ThreadId, Unhooked};
use crate::error::{NativeError, INVALID_HOOK_HANDLE};
use crate::idler::prompt::{Prompt, PromptChoice};
use crate::monitor::activity::{ActivityClock, UserControlGate};
use crate::monitor::input_hooks::HookEvent;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

enum FakeMessage {
    Quit,
    Input(HookEvent),
}

thread_local! {
    static THREAD_ID: Cell<Option<ThreadId>> = const { Cell::new(None) };
    static QUEUE: RefCell<Option<Receiver<FakeMessage>>> = const { RefCell::new(None) };
    static PROCS: RefCell<HashMap<u64, (HookKind, HookProc)>> = RefCell::new(HashMap::new());
}

pub struct FakeHook {
    id: u64,
}

/// Scripted fake of [`InputBackend`].
pub struct FakeBackend {
    next_thread_id: AtomicU32,
    next_hook_id: AtomicU64,
    queues: Mutex<HashMap<ThreadId, Sender<FakeMessage>>>,
    registered: Mutex<HashMap<u64, ThreadId>>,
    quit_posts: Mutex<Vec<ThreadId>>,
    fail_register: Mutex<Option<HookKind>>,
    hooks_already_invalid: AtomicBool,
    fail_quit: AtomicBool,
    loop_error: Mutex<Option<NativeError>>,
    next_hook_result: Mutex<Result<isize, NativeError>>,
    forwarded: AtomicUsize,
    cursor: Mutex<Point>,
    writes: Mutex<Vec<Point>>,
    gate_probe: Mutex<Option<Arc<UserControlGate>>>,
    gate_during_writes: Mutex<Vec<bool>>,
    touch_after_writes: Mutex<Option<(usize, Arc<ActivityClock>)>>,
    prompt_script: Mutex<VecDeque<PromptChoice>>,
    prompt_delay: Mutex<Duration>,
    prompt_error: Mutex<Option<NativeError>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_thread_id: AtomicU32::new(1000),
            next_hook_id: AtomicU64::new(1),
            queues: Mutex::default(),
            registered: Mutex::default(),
            quit_posts: Mutex::default(),
            fail_register: Mutex::default(),
            hooks_already_invalid: AtomicBool::new(false),
            fail_quit: AtomicBool::new(false),
            loop_error: Mutex::default(),
            next_hook_result: Mutex::new(Ok(0)),
            forwarded: AtomicUsize::new(0),
            cursor: Mutex::new(Point::new(500, 400)),
            writes: Mutex::default(),
            gate_probe: Mutex::default(),
            gate_during_writes: Mutex::default(),
            touch_after_writes: Mutex::default(),
            prompt_script: Mutex::default(),
            prompt_delay: Mutex::new(Duration::from_millis(20)),
            prompt_error: Mutex::default(),
            prompts: Mutex::default(),
        }
    }

    // --- scripting -----------------------------------------------------------

    pub fn fail_registration(&self, kind: HookKind) {
        *self.fail_register.lock().unwrap() = Some(kind);
    }

    pub fn report_hooks_already_invalid(&self) {
        self.hooks_already_invalid.store(true, Ordering::SeqCst);
    }

    /// Makes the next `post_quit` fail without reaching the queue.
    pub fn fail_next_quit(&self) {
        self.fail_quit.store(true, Ordering::SeqCst);
    }

    pub fn fail_message_loop(&self, error: NativeError) {
        *self.loop_error.lock().unwrap() = Some(error);
    }

    pub fn set_next_hook_result(&self, result: Result<isize, NativeError>) {
        *self.next_hook_result.lock().unwrap() = result;
    }

    pub fn set_cursor(&self, point: Point) {
        *self.cursor.lock().unwrap() = point;
    }

    /// Records whether `gate` was held at each cursor write.
    pub fn probe_gate(&self, gate: Arc<UserControlGate>) {
        *self.gate_probe.lock().unwrap() = Some(gate);
    }

    /// Simulates the user grabbing the mouse right after the n-th write.
    pub fn touch_after_writes(&self, writes: usize, clock: Arc<ActivityClock>) {
        *self.touch_after_writes.lock().unwrap() = Some((writes, clock));
    }

    pub fn script_prompts(&self, choices: impl IntoIterator<Item = PromptChoice>) {
        self.prompt_script.lock().unwrap().extend(choices);
    }

    pub fn set_prompt_delay(&self, delay: Duration) {
        *self.prompt_delay.lock().unwrap() = delay;
    }

    pub fn fail_prompt(&self, error: NativeError) {
        *self.prompt_error.lock().unwrap() = Some(error);
    }

    /// Delivers an input event to the hooks of `thread`.
    pub fn inject(&self, thread: ThreadId, event: HookEvent) {
        let queues = self.queues.lock().unwrap();
        let sender = queues.get(&thread).expect("thread has no message queue");
        sender.send(FakeMessage::Input(event)).unwrap();
    }

    // --- inspection ----------------------------------------------------------

    pub fn registered_hooks(&self) -> usize {
        self.registered.lock().unwrap().len()
    }

    pub fn quit_posts(&self) -> Vec<ThreadId> {
        self.quit_posts.lock().unwrap().clone()
    }

    pub fn forwarded_events(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }

    pub fn cursor_writes(&self) -> Vec<Point> {
        self.writes.lock().unwrap().clone()
    }

    pub fn gate_during_writes(&self) -> Vec<bool> {
        self.gate_during_writes.lock().unwrap().clone()
    }

    pub fn prompts_shown(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    fn current_thread(&self) -> Result<ThreadId, NativeError> {
        THREAD_ID
            .with(Cell::get)
            .ok_or_else(|| NativeError::new("current_thread", 1444, "thread has no message queue"))
    }
}

impl InputBackend for FakeBackend {
    type Hook = FakeHook;

    fn prepare_thread(&self) -> Result<ThreadId, NativeError> {
        let id = self.next_thread_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        self.queues.lock().unwrap().insert(id, tx);
        THREAD_ID.with(|cell| cell.set(Some(id)));
        QUEUE.with(|queue| *queue.borrow_mut() = Some(rx));
        Ok(id)
    }

    fn register_hook(&self, kind: HookKind, proc: HookProc) -> Result<FakeHook, NativeError> {
        let thread = self.current_thread()?;
        if *self.fail_register.lock().unwrap() == Some(kind) {
            return Err(NativeError::new("register_hook", 5, "Access is denied."));
        }
        let id = self.next_hook_id.fetch_add(1, Ordering::SeqCst);
        PROCS.with(|procs| procs.borrow_mut().insert(id, (kind, proc)));
        self.registered.lock().unwrap().insert(id, thread);
        Ok(FakeHook { id })
    }

    fn unregister_hook(&self, hook: FakeHook) -> Result<Unhooked, NativeError> {
        let thread = self.current_thread()?;
        let mut registered = self.registered.lock().unwrap();
        match registered.get(&hook.id) {
            Some(owner) if *owner == thread => {}
            Some(_) => {
                return Err(NativeError::new(
                    "unregister_hook",
                    INVALID_HOOK_HANDLE,
                    "hook removed from a foreign thread",
                ))
            }
            None => return Ok(Unhooked::AlreadyInvalid),
        }
        registered.remove(&hook.id);
        PROCS.with(|procs| procs.borrow_mut().remove(&hook.id));
        if self.hooks_already_invalid.load(Ordering::SeqCst) {
            Ok(Unhooked::AlreadyInvalid)
        } else {
            Ok(Unhooked::Removed)
        }
    }

    fn run_message_loop(&self) -> Result<(), NativeError> {
        if let Some(e) = self.loop_error.lock().unwrap().take() {
            return Err(e);
        }
        let queue = QUEUE
            .with(|queue| queue.borrow_mut().take())
            .ok_or_else(|| NativeError::new("run_message_loop", 1444, "no message queue"))?;
        loop {
            match queue.recv() {
                Ok(FakeMessage::Quit) => break,
                Ok(FakeMessage::Input(event)) => PROCS.with(|procs| {
                    for (kind, proc) in procs.borrow_mut().values_mut() {
                        if *kind == event.kind {
                            proc(&event);
                        }
                    }
                }),
                Err(_) => {
                    return Err(NativeError::new("run_message_loop", 6, "queue closed"));
                }
            }
        }
        QUEUE.with(|slot| *slot.borrow_mut() = Some(queue));
        Ok(())
    }

    fn post_quit(&self, thread: ThreadId) -> Result<(), NativeError> {
        if self.fail_quit.swap(false, Ordering::SeqCst) {
            return Err(NativeError::new("post_quit", 8, "Not enough quota."));
        }
        self.quit_posts.lock().unwrap().push(thread);
        let queues = self.queues.lock().unwrap();
        let sender = queues
            .get(&thread)
            .ok_or_else(|| NativeError::new("post_quit", 1444, "Invalid thread identifier."))?;
        sender
            .send(FakeMessage::Quit)
            .map_err(|_| NativeError::new("post_quit", 1444, "Invalid thread identifier."))
    }

    fn call_next_hook(&self, _event: &HookEvent) -> Result<isize, NativeError> {
        self.forwarded.fetch_add(1, Ordering::SeqCst);
        self.next_hook_result.lock().unwrap().clone()
    }

    fn cursor_position(&self) -> Result<Point, NativeError> {
        Ok(*self.cursor.lock().unwrap())
    }

    fn set_cursor_position(&self, point: Point) -> Result<(), NativeError> {
        *self.cursor.lock().unwrap() = point;
        let written = {
            let mut writes = self.writes.lock().unwrap();
            writes.push(point);
            writes.len()
        };
        if let Some(gate) = self.gate_probe.lock().unwrap().as_ref() {
            self.gate_during_writes
                .lock()
                .unwrap()
                .push(gate.is_idler_driving());
        }
        if let Some((after, clock)) = self.touch_after_writes.lock().unwrap().as_ref() {
            if *after == written {
                clock.touch();
            }
        }
        Ok(())
    }

    fn show_prompt(&self, prompt: &Prompt) -> Result<PromptChoice, NativeError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        thread::sleep(*self.prompt_delay.lock().unwrap());
        if let Some(e) = self.prompt_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self
            .prompt_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PromptChoice::Cancel))
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
