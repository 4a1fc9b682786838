//! Tempo, timebase and metronome/clock-to-host accounting (C3).
//!
//! Ported from `mpu_t.clock` plus the `MPUClockBase`/`cth_data` tables
//! in `snd_mpu401.c`. `tick()`-and-reload shape modelled on
//! `c64_emu/cia/tod.rs::Tod`.

/// `MPU401_TIMECONSTANT`: 60,000,000 µs/min / 24 PPQN metronome base.
pub const TIMECONSTANT_USEC: u64 = 60_000_000 / 24;

/// Selectable timebases for opcodes `0xC2..=0xC8` (`spec.md` §4.2).
pub const MPU_CLOCK_BASE: [u32; 7] = [48, 72, 96, 120, 144, 168, 192];

/// Four-phase clock-to-host rate table seed, indexed by
/// `((operand & 3) << 2) + i` for `i in 0..4` (`spec.md` §4.3, opcode
/// `0xE7`).
const CTH_DATA_TABLE: [u8; 16] = [0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, 1, 1, 0];

/// Tempo/timebase/metronome state (`spec.md` §3 "ClockState").
#[derive(Debug, Clone)]
pub struct ClockState {
    pub tempo: u8,
    pub timebase: u32,
    pub tempo_rel: u8,
    pub tempo_grad: u8,
    pub midimetro: u8,
    pub metromeas: u8,

    pub measure_counter: u32,
    pub cth_counter: u8,
    pub cth_mode: u8,
    pub cth_rate: [u8; 4],
    pub rec_counter: u8,

    /// Snapshot of `measure_counter`/`cth_counter` taken on MIDI-stop,
    /// restored on MIDI-continue (`snd_mpu401.c` `case 1`/`case 3` of
    /// the realtime dispatch; see `SPEC_FULL.md` §3).
    pub meas_old: u32,
    pub cth_old: u8,

    /// Reset-baseline snapshots. Never read back by any command in
    /// the original either — kept for fidelity, not functionality
    /// (see DESIGN.md Open Questions).
    pub old_tempo: u8,
    pub old_timebase: u32,
    pub old_tempo_rel: u8,

    /// Whether the periodic event timer is currently armed
    /// (`mpu->clock.active`).
    pub active: bool,
}

impl ClockState {
    /// Clamp range for the `tempo` field, from `clamp(val, 4, 250)` in
    /// `snd_mpu401.c`.
    pub const TEMPO_MIN: u8 = 4;
    pub const TEMPO_MAX: u8 = 250;

    pub fn reset(&mut self) {
        *self = ClockState {
            tempo: 100,
            timebase: 120,
            tempo_rel: 0x40,
            tempo_grad: 0,
            midimetro: 12,
            metromeas: 8,
            measure_counter: 0,
            cth_counter: 0,
            cth_mode: 0,
            cth_rate: [60; 4],
            rec_counter: 0,
            meas_old: 0,
            cth_old: 0,
            old_tempo: 100,
            old_timebase: 120,
            old_tempo_rel: 0x40,
            active: false,
        };
    }

    /// Set the tempo, clamped to `[4, 250]` (opcode `0xE0` operand).
    pub fn set_tempo(&mut self, val: u8) {
        self.tempo = val.clamp(Self::TEMPO_MIN, Self::TEMPO_MAX);
    }

    /// Set the timebase from the seven-entry table (opcodes `0xC2..=0xC8`).
    pub fn set_timebase_index(&mut self, index: usize) {
        debug_assert!(index < MPU_CLOCK_BASE.len());
        self.timebase = MPU_CLOCK_BASE[index];
    }

    /// Recompute the four-phase clock-to-host rate table from a
    /// single operand (opcode `0xE7`): `0` is treated as `64`, and
    /// `cth_mode` restarts at phase 0.
    pub fn set_cth_interval(&mut self, operand: u8) {
        let val = if operand == 0 { 64 } else { operand };
        for i in 0..4 {
            self.cth_rate[i] = (val >> 2) + CTH_DATA_TABLE[(((val & 3) as usize) << 2) + i];
        }
        self.cth_mode = 0;
    }

    /// Microseconds between successive `EventEngine` ticks at the
    /// current tempo/timebase (`spec.md` §4.6).
    pub fn event_period_usec(&self) -> u64 {
        TIMECONSTANT_USEC / (self.tempo as u64 * self.timebase as u64)
    }

    /// `max_meascnt` for measure-pulse accounting (`spec.md` §4.6
    /// step 6).
    pub fn max_measure_count(&self) -> u32 {
        (self.timebase * self.midimetro as u32 * self.metromeas as u32) / 24
    }
}

impl Default for ClockState {
    fn default() -> Self {
        let mut c = ClockState {
            tempo: 100,
            timebase: 120,
            tempo_rel: 0x40,
            tempo_grad: 0,
            midimetro: 12,
            metromeas: 8,
            measure_counter: 0,
            cth_counter: 0,
            cth_mode: 0,
            cth_rate: [60; 4],
            rec_counter: 0,
            meas_old: 0,
            cth_old: 0,
            old_tempo: 100,
            old_timebase: 120,
            old_tempo_rel: 0x40,
            active: false,
        };
        c.reset();
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_clamps_to_range() {
        let mut c = ClockState::default();
        c.set_tempo(3);
        assert_eq!(c.tempo, 4);
        c.set_tempo(255);
        assert_eq!(c.tempo, 250);
        c.set_tempo(120);
        assert_eq!(c.tempo, 120);
    }

    #[test]
    fn timebase_table_lookup() {
        let mut c = ClockState::default();
        c.set_timebase_index(0);
        assert_eq!(c.timebase, 48);
        c.set_timebase_index(6);
        assert_eq!(c.timebase, 192);
    }

    #[test]
    fn measure_pulse_count_matches_scenario_6() {
        let mut c = ClockState::default();
        c.tempo = 100;
        c.timebase = 120;
        c.midimetro = 12;
        c.metromeas = 8;
        assert_eq!(c.max_measure_count(), 480);
    }

    #[test]
    fn cth_interval_zero_operand_treated_as_64() {
        let mut c = ClockState::default();
        c.set_cth_interval(0);
        // val = 64 -> val>>2 = 16, table slice is the first 4 entries (0,0,0,0)
        assert_eq!(c.cth_rate, [16, 16, 16, 16]);
        assert_eq!(c.cth_mode, 0);
    }
}
