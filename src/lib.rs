//! Roland MPU-401 intelligent-mode protocol engine.
//!
//! This crate is the *core* of an MPU-401 emulation: the state machine
//! that turns host writes to the command/data ports into outbound MIDI
//! bytes, timed host interrupts and a recording stream. It does not
//! touch a bus, a PIC, a scheduler or a MIDI transport directly —
//! those are external collaborators reached through the traits in
//! [`sink`], [`irq`] and [`scheduler`].
//!
//! See `SPEC_FULL.md` in the repository root for the full behavioural
//! specification this crate implements.

mod config;
mod irq;
mod mpu;
mod scheduler;
mod sink;
#[cfg(test)]
mod test_support;

pub use config::{BaseAddr, Config, ConfigError, Irq};
pub use irq::IrqLine;
pub use mpu::mode::Mode;
pub use mpu::{Device, DATA_PORT_OFFSET, STATUS_PORT_OFFSET};
pub use scheduler::{Scheduler, TimerKind};
pub use sink::MidiSink;
