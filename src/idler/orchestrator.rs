//! Prompt-driven idle cycle.
//!
//! Every cycle shows the control prompt on its own thread. While the prompt
//! is open after a TRY AGAIN, hooks run and the mouse keeps moving; after a
//! CONTINUE the idler just waits for the next answer. Anything else ends the
//! program.

use crate::backend::InputBackend;
use crate::config::IdlerConfig;
use crate::error::{IdleError, NativeError, Result};
use crate::idler::mover::{IdleMover, MoveOutcome, MoverConfig};
use crate::idler::prompt::{Prompt, PromptChoice};
use crate::monitor::activity::{ActivityClock, UserControlGate};
use crate::monitor::supervisor::HookSupervisor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A prompt being answered on another thread.
struct PendingPrompt {
    handle: JoinHandle<std::result::Result<PromptChoice, NativeError>>,
}

impl PendingPrompt {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn join(self) -> Result<PromptChoice> {
        match self.handle.join() {
            Ok(choice) => Ok(choice?),
            Err(_) => Err(IdleError::PromptPanicked),
        }
    }
}

pub struct Orchestrator<B: InputBackend> {
    backend: Arc<B>,
    clock: Arc<ActivityClock>,
    gate: Arc<UserControlGate>,
    mover: IdleMover<B>,
    prompt: Prompt,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<B: InputBackend> Orchestrator<B> {
    pub fn new(backend: Arc<B>, config: &IdlerConfig) -> Result<Self> {
        config.validate()?;
        let clock = Arc::new(ActivityClock::new());
        let gate = Arc::new(UserControlGate::new());
        let mover = IdleMover::new(
            Arc::clone(&backend),
            Arc::clone(&clock),
            Arc::clone(&gate),
            MoverConfig::from(config),
        );
        Ok(Self {
            backend,
            clock,
            gate,
            mover,
            prompt: Prompt::idler(config.cooldown()),
            poll_interval: config.poll_interval(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that ends the cycle at the next poll when set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Runs prompt cycles until the user picks something other than
    /// TRY AGAIN or CONTINUE, and returns that choice.
    ///
    /// A shutdown request ends the loop early with [`PromptChoice::Cancel`].
    pub fn run(&self) -> Result<PromptChoice> {
        let mut supervisor = HookSupervisor::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.clock),
            Arc::clone(&self.gate),
        );
        let mut choice = PromptChoice::TryAgain;

        while choice.keeps_running() {
            let pending = self.spawn_prompt()?;
            tracing::info!("Opened window");

            if choice == PromptChoice::TryAgain {
                // The user just answered the prompt; give them a full cooldown.
                self.clock.touch();
                let mut session = supervisor.session()?;
                while !pending.is_finished() {
                    if self.shutdown_requested() {
                        session.finish()?;
                        return Ok(PromptChoice::Cancel);
                    }
                    session.check_worker()?;
                    let report = self.mover.move_once()?;
                    if report.outcome == MoveOutcome::Interrupted {
                        thread::sleep(self.poll_interval);
                    }
                }
                session.finish()?;
            } else {
                while !pending.is_finished() {
                    if self.shutdown_requested() {
                        return Ok(PromptChoice::Cancel);
                    }
                    thread::sleep(self.poll_interval);
                }
            }

            choice = pending.join()?;
            tracing::info!(?choice, "Prompt answered");
        }

        Ok(choice)
    }

    fn spawn_prompt(&self) -> Result<PendingPrompt> {
        let backend = Arc::clone(&self.backend);
        let prompt = self.prompt.clone();
        let handle = thread::Builder::new()
            .name("idler-prompt".into())
            .spawn(move || backend.show_prompt(&prompt))?;
        Ok(PendingPrompt { handle })
    }
}
