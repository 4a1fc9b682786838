//! The device's scalar state flags (`spec.md` §3 "StateFlags").
//!
//! Ported from the flag cluster in `mpu_t`; shape mirrors how
//! `PageMapping` groups the CIA's mode bits in the teacher's register
//! bank.

/// Recording state machine (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecState {
    RecOff,
    RecStb,
    RecOn,
}

/// Data-port parse submode priority (`spec.md` §4.3), folded into the
/// three-valued `data_onoff` counter the original uses for both the
/// conductor and track parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOnOff {
    Idle,
    Stage0,
    Stage1,
    Stage2,
}

impl DataOnOff {
    pub fn as_i8(self) -> i8 {
        match self {
            DataOnOff::Idle => -1,
            DataOnOff::Stage0 => 0,
            DataOnOff::Stage1 => 1,
            DataOnOff::Stage2 => 2,
        }
    }
}

/// All of the device's scalar, non-table state.
#[derive(Debug, Clone)]
pub struct StateFlags {
    pub playing: bool,
    pub clock_to_host: bool,
    pub rec: RecState,
    pub reset: bool,
    /// `0` means no buffered command; carries `value + 1` while a
    /// command arrives mid-reset so `0` can mean "none" (`spec.md`
    /// §4.2, §5).
    pub cmd_pending: u16,
    pub wsd: bool,
    pub wsm: bool,
    pub wsd_start: bool,
    pub cond_req: bool,
    pub cond_set: bool,
    pub conductor: bool,
    pub data_onoff: DataOnOff,
    pub track: u8,
    pub old_track: u8,
    /// The opcode stashed by `0xE0..=0xEF` awaiting its data-port
    /// operand; `None` when no command byte is pending.
    pub command_byte: Option<u8>,
    pub send_now: bool,
    pub block_ack: bool,
    pub eoi_scheduled: bool,
    pub sysex_in_finished: bool,
    pub rec_copy: bool,
    pub irq_pending: bool,
    pub tmask: u8,
    pub amask: u8,
    pub cmask: u8,
    pub midi_mask: u16,
    pub req_mask: u16,
    pub last_rtcmd: u8,
}

impl StateFlags {
    /// `MPU401_Reset` never touches `reset` itself -- that field is
    /// owned by the command write that triggered the reset (which
    /// sets it `true` just before calling this) and by the reset-done
    /// timer callback (which clears it once the busy window elapses).
    /// Preserve whatever the caller already had in place.
    pub fn reset_to_defaults(&mut self) {
        let reset = self.reset;
        *self = StateFlags {
            playing: false,
            clock_to_host: false,
            rec: RecState::RecOff,
            reset,
            cmd_pending: 0,
            wsd: false,
            wsm: false,
            wsd_start: false,
            cond_req: false,
            cond_set: false,
            conductor: false,
            data_onoff: DataOnOff::Idle,
            track: 0,
            old_track: 0,
            command_byte: None,
            send_now: false,
            block_ack: false,
            eoi_scheduled: false,
            sysex_in_finished: false,
            rec_copy: false,
            irq_pending: false,
            tmask: 0xff,
            amask: 0,
            cmask: 0xff,
            midi_mask: 0xffff,
            req_mask: 0,
            last_rtcmd: 0,
        };
    }

    /// `spec.md` §3 invariant: the periodic event timer is only
    /// needed while one of these holds.
    pub fn needs_periodic_timer(&self) -> bool {
        self.playing || self.clock_to_host || self.rec == RecState::RecOn
    }
}

impl Default for StateFlags {
    fn default() -> Self {
        let mut s = StateFlags {
            playing: false,
            clock_to_host: false,
            rec: RecState::RecOff,
            reset: false,
            cmd_pending: 0,
            wsd: false,
            wsm: false,
            wsd_start: false,
            cond_req: false,
            cond_set: false,
            conductor: false,
            data_onoff: DataOnOff::Idle,
            track: 0,
            old_track: 0,
            command_byte: None,
            send_now: false,
            block_ack: false,
            eoi_scheduled: false,
            sysex_in_finished: false,
            rec_copy: false,
            irq_pending: false,
            tmask: 0,
            amask: 0,
            cmask: 0,
            midi_mask: 0,
            req_mask: 0,
            last_rtcmd: 0,
        };
        s.reset_to_defaults();
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_periodic_timer_tracks_playing_and_recording() {
        let mut s = StateFlags::default();
        assert!(!s.needs_periodic_timer());
        s.playing = true;
        assert!(s.needs_periodic_timer());
        s.playing = false;
        s.rec = RecState::RecOn;
        assert!(s.needs_periodic_timer());
    }

    #[test]
    fn data_onoff_maps_to_spec_integers() {
        assert_eq!(DataOnOff::Idle.as_i8(), -1);
        assert_eq!(DataOnOff::Stage2.as_i8(), 2);
    }
}
