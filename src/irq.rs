//! Host IRQ line contract.
//!
//! Split out of [`crate::sink::MidiSink`] the way the teacher splits
//! `InterruptSource` out of the CIA register file in
//! `c64_emu/cia/mod.rs` — it is a distinct physical signal (the PIC
//! line), not a MIDI byte stream.

/// The host's interrupt line for this device's IRQ.
pub trait IrqLine: Send {
    /// Assert the line (a host-visible interrupt is now pending).
    fn assert(&mut self);

    /// Deassert the line (the host has drained everything pending).
    fn deassert(&mut self);
}
