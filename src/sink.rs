//! Outbound MIDI transport contract.
//!
//! The core never writes to a serial port or a synth directly — it
//! hands bytes to whatever implements this trait. Mirrors the shape of
//! `SidDevice` in the teacher repo: one method per hardware primitive,
//! owned as a boxed trait object by the engine.

/// The outbound MIDI sink: raw bytes, realtime bytes, and the two
/// transport-level resets the original firmware issues on `MPU401_Reset`.
pub trait MidiSink: Send {
    /// Emit one ordinary MIDI byte (status, data, or a non-realtime
    /// system byte) onto the wire.
    fn raw_byte(&mut self, byte: u8);

    /// Emit a single realtime byte (0xF8..0xFF) out-of-band from
    /// normal message framing, so it can be interleaved mid-message on
    /// real hardware.
    fn realtime_byte(&mut self, byte: u8);

    /// Reset the downstream MIDI device (panic button / all sound off
    /// at the transport level), issued once per device reset.
    fn reset(&mut self);

    /// Drop any buffered partial message on the transport.
    fn clear_buffer(&mut self);
}
