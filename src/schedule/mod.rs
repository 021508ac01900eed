//! The shared debounce timer.
//!
//! One timer serves every watched source. Arming replaces any pending
//! deadline; the timer fires once per arm cycle. Time is always passed in,
//! so the timer itself never sleeps.

mod activity;


use std::time::{Duration, Instant};

pub use activity::{Activity, UnknownActivity};

/// Sleep used when nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);
/// Countdown granularity.
const TICK: Duration = Duration::from_secs(1);

/// Timer state change, delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Armed { remaining_secs: u64 },
    Tick { remaining_secs: u64 },
    Cancelled,
    Fired,
}

/// Passive listener for countdown display.
pub trait SchedulerObserver: Send {
    fn on_timer(&self, event: TimerEvent);
}

pub struct DebounceTimer {
    quiet: Duration,
    deadline: Option<Instant>,
    last_tick: Option<u64>,
    observers: Vec<Box<dyn SchedulerObserver>>,
}

impl DebounceTimer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
            last_tick: None,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SchedulerObserver>) {
        self.observers.push(observer);
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Start (or restart) the quiet period. A zero quiet period means manual
    /// rebuilds only, so nothing is armed.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.quiet.is_zero() {
            return false;
        }
        self.deadline = Some(now + self.quiet);
        let remaining_secs = self.quiet.as_secs_f64().ceil() as u64;
        self.last_tick = Some(remaining_secs);
        self.notify(TimerEvent::Armed { remaining_secs });
        true
    }

    /// Restart the quiet period only if one is pending.
    pub fn reset_if_armed(&mut self, now: Instant) -> bool {
        self.is_armed() && self.arm(now)
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.deadline.take().is_some();
        self.last_tick = None;
        if was_armed {
            self.notify(TimerEvent::Cancelled);
        }
        was_armed
    }

    /// Change the quiet period. A pending deadline restarts with the new
    /// period, or is cancelled when the period becomes zero.
    pub fn set_quiet(&mut self, quiet: Duration, now: Instant) {
        if quiet == self.quiet {
            return;
        }
        self.quiet = quiet;
        if self.is_armed() && !self.arm(now) {
            self.cancel();
        }
    }

    /// Advance to `now`. Returns `true` exactly once per arm cycle, when the
    /// deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now >= deadline {
            self.deadline = None;
            self.last_tick = None;
            self.notify(TimerEvent::Fired);
            return true;
        }

        let remaining_secs = self.countdown(now).unwrap_or(0);
        if self.last_tick != Some(remaining_secs) {
            self.last_tick = Some(remaining_secs);
            self.notify(TimerEvent::Tick { remaining_secs });
        }
        false
    }

    /// Whole seconds left, rounded up.
    pub fn countdown(&self, now: Instant) -> Option<u64> {
        let deadline = self.deadline?;
        let remaining = deadline.saturating_duration_since(now);
        Some(remaining.as_secs_f64().ceil() as u64)
    }

    /// How long the owner may sleep before the next `poll` matters.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        let Some(deadline) = self.deadline else {
            return IDLE;
        };
        let remaining = deadline.saturating_duration_since(now);
        if self.observers.is_empty() {
            return remaining;
        }
        // Wake on the next whole-second boundary for the countdown.
        let frac = Duration::from_secs_f64(remaining.as_secs_f64().fract());
        let to_tick = if frac.is_zero() { TICK } else { frac };
        remaining.min(to_tick)
    }

    fn notify(&self, event: TimerEvent) {
        for observer in &self.observers {
            observer.on_timer(event);
        }
    }
}

impl std::fmt::Debug for DebounceTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceTimer")
            .field("quiet", &self.quiet)
            .field("deadline", &self.deadline)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Renders the countdown through the shared watch status line.
pub struct StatusCountdown;

impl SchedulerObserver for StatusCountdown {
    fn on_timer(&self, event: TimerEvent) {
        match event {
            TimerEvent::Armed { remaining_secs } | TimerEvent::Tick { remaining_secs } => {
                crate::logger::status_unchanged(&format!("install in {remaining_secs}s"));
            }
            TimerEvent::Cancelled | TimerEvent::Fired => {}
        }
    }
}
