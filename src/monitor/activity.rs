//! Lock-free activity tracking shared between the hook and mover threads.
//!
//! Both types are single atomics read and written with relaxed ordering.
//! A late read costs at most one extra or one missed cooldown check; the
//! mover re-reads on every step, so no state can be corrupted.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Time of the last genuine user input.
///
/// Written only from the hook callback, read by the mover.
#[derive(Debug)]
pub struct ActivityClock {
    origin: Instant,
    /// Nanoseconds from `origin` to the last touch. May be negative when
    /// touched with an instant earlier than the clock itself.
    last_input_nanos: AtomicI64,
}

impl ActivityClock {
    /// Creates a clock that counts as touched right now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_input_nanos: AtomicI64::new(0),
        }
    }

    /// Records genuine input at the current instant.
    #[inline]
    pub fn touch(&self) {
        self.touch_at(Instant::now());
    }

    /// Records genuine input at `at`.
    pub fn touch_at(&self, at: Instant) {
        let nanos = match at.checked_duration_since(self.origin) {
            Some(after) => saturating_nanos(after),
            None => -saturating_nanos(self.origin.duration_since(at)),
        };
        self.last_input_nanos.store(nanos, Ordering::Relaxed);
    }

    /// Time elapsed since the last touch.
    pub fn idle_for(&self) -> Duration {
        let now = saturating_nanos(self.origin.elapsed());
        let last = self.last_input_nanos.load(Ordering::Relaxed);
        let idle = now.saturating_sub(last).max(0);
        Duration::from_nanos(idle as u64)
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// Marks the windows in which the idler itself is moving the cursor.
///
/// The hook callback samples this before refreshing the [`ActivityClock`],
/// so the idler's own cursor writes are not mistaken for a user.
#[derive(Debug, Default)]
pub struct UserControlGate {
    idler_driving: AtomicBool,
}

impl UserControlGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands control to the idler until the returned guard is ended or dropped.
    #[must_use = "control returns to the user when the guard is dropped"]
    pub fn begin(&self) -> ControlGuard<'_> {
        self.idler_driving.store(true, Ordering::Relaxed);
        ControlGuard { gate: self }
    }

    /// Whether the idler currently owns the cursor.
    #[inline]
    pub fn is_idler_driving(&self) -> bool {
        self.idler_driving.load(Ordering::Relaxed)
    }

    fn release(&self) {
        self.idler_driving.store(false, Ordering::Relaxed);
    }
}

/// Bracket around one synthetic cursor write.
pub struct ControlGuard<'a> {
    gate: &'a UserControlGate,
}

impl ControlGuard<'_> {
    /// Returns control to the user.
    pub fn end(self) {}
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
