//! One-shot/periodic timer contract.
//!
//! The core owns no wall-clock or cycle-counter of its own; it asks
//! the host to call back into [`crate::Device::on_timer`] after a
//! given number of microseconds. This collapses the original's three
//! `timer_t` instances (`mpu401_event_callback`, `mpu401_eoi_callback`,
//! `mpu401_reset_callback`) into one trait parameterised by
//! [`TimerKind`].

/// Which of the three timers a [`Scheduler`] call concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The periodic tempo-driven tick (`MPU401_Event`).
    Event,
    /// The 60 µs deferred "end of input" callback.
    Eoi,
    /// The one-shot reset-busy window armed by writing 0xFF.
    ResetDone,
}

/// Host-provided timer primitives. One-shot unless the device
/// re-arms a timer from within its own callback (as `Event` always
/// does, to stay periodic).
pub trait Scheduler: Send {
    /// Arm `timer` to fire after `micros` microseconds, replacing any
    /// previous arming.
    fn arm(&mut self, timer: TimerKind, micros: u64);

    /// Re-arm an already-running periodic timer for another `micros`
    /// microseconds from *now*, without otherwise disturbing it.
    fn advance(&mut self, timer: TimerKind, micros: u64);

    /// Disable `timer`; it will not fire until armed again.
    fn disable(&mut self, timer: TimerKind);
}
