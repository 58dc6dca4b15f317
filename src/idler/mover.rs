//! Synthetic cursor movement.
//!
//! Each move walks the cursor along a random straight ray in unit steps,
//! checking before every step whether a real user has taken over.

use crate::backend::{InputBackend, Point};
use crate::config::IdlerConfig;
use crate::error::Result;
use crate::monitor::activity::{ActivityClock, UserControlGate};
use rand::Rng;
use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Trajectory parameters.
#[derive(Debug, Clone)]
pub struct MoverConfig {
    pub min_radius: f64,
    pub max_radius: f64,
    /// Distance covered per step, in pixels.
    pub step_length: f64,
    /// Sleep after each step.
    pub step_interval: Duration,
    /// A move aborts while the last user input is younger than this.
    pub cooldown: Duration,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            min_radius: 75.0,
            max_radius: 300.0,
            step_length: 1.0,
            step_interval: Duration::from_millis(10),
            cooldown: Duration::from_secs(3),
        }
    }
}

impl From<&IdlerConfig> for MoverConfig {
    fn from(config: &IdlerConfig) -> Self {
        Self {
            min_radius: config.min_radius,
            max_radius: config.max_radius,
            step_length: config.step_length,
            step_interval: config.step_interval(),
            cooldown: config.cooldown(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Completed,
    /// A real user took over; the cursor stays where the idler left it.
    Interrupted,
}

/// What a single move did.
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub radius: f64,
    pub heading_degrees: f64,
    pub planned_steps: u32,
    pub steps_taken: u32,
    pub elapsed: Duration,
    pub outcome: MoveOutcome,
}

/// Number of whole steps that fit in `radius`.
pub fn plan_steps(radius: f64, step_length: f64) -> u32 {
    if !(radius > 0.0 && step_length > 0.0) {
        return 0;
    }
    (radius / step_length).floor() as u32
}

pub struct IdleMover<B: InputBackend> {
    backend: Arc<B>,
    clock: Arc<ActivityClock>,
    gate: Arc<UserControlGate>,
    config: MoverConfig,
}

impl<B: InputBackend> IdleMover<B> {
    pub fn new(
        backend: Arc<B>,
        clock: Arc<ActivityClock>,
        gate: Arc<UserControlGate>,
        config: MoverConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            gate,
            config,
        }
    }

    /// Moves along a random ray using the thread-local RNG.
    pub fn move_once(&self) -> Result<MoveReport> {
        self.move_with(&mut rand::thread_rng())
    }

    /// Moves along a ray drawn from `rng`.
    pub fn move_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MoveReport> {
        let radius = rng.gen_range(self.config.min_radius..=self.config.max_radius);
        let angle = rng.gen_range(-PI..=PI);
        self.move_along(radius, angle)
    }

    /// Walks `radius` pixels from the current cursor position at `angle`
    /// radians, stopping early if the user becomes active.
    pub fn move_along(&self, radius: f64, angle: f64) -> Result<MoveReport> {
        let started = Instant::now();
        let planned_steps = plan_steps(radius, self.config.step_length);
        let (dx, dy) = (
            self.config.step_length * angle.cos(),
            self.config.step_length * angle.sin(),
        );

        let origin = self.backend.cursor_position()?;
        let (mut x, mut y) = (f64::from(origin.x), f64::from(origin.y));
        let mut steps_taken = 0;
        let mut outcome = MoveOutcome::Completed;

        for _ in 0..planned_steps {
            if self.clock.idle_for() < self.config.cooldown {
                outcome = MoveOutcome::Interrupted;
                break;
            }
            x += dx;
            y += dy;

            let guard = self.gate.begin();
            self.backend
                .set_cursor_position(Point::new(x as i32, y as i32))?;
            guard.end();
            steps_taken += 1;

            if !self.config.step_interval.is_zero() {
                thread::sleep(self.config.step_interval);
            }
        }

        let report = MoveReport {
            radius,
            heading_degrees: angle.to_degrees(),
            planned_steps,
            steps_taken,
            elapsed: started.elapsed(),
            outcome,
        };
        match outcome {
            MoveOutcome::Completed => {
                let distance = format!("{:.1}", report.radius);
                let heading = format!("{:.1}°", report.heading_degrees);
                tracing::info!(
                    %distance,
                    %heading,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Moved cursor"
                )
            }
            MoveOutcome::Interrupted => tracing::debug!(
                steps_taken,
                planned_steps,
                "User active, move interrupted"
            ),
        }
        Ok(report)
    }
}
