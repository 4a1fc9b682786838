//! UART vs. intelligent operating mode (`spec.md` §3 "Mode").

/// The device's two top-level operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Transparent MIDI byte pipe; only 0xFF and 0x3F are meaningful
    /// on the command port.
    Uart,
    /// The full track/conductor protocol engine.
    Intelligent,
}
