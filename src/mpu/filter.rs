//! Filter flags governing thru, record and input behaviour (C2).
//!
//! Ported field-for-field from `mpu_t.filter` in `snd_mpu401.c`.

/// Boolean filter flags plus the program-change replay buffer they
/// gate (`spec.md` §3 "Filter").
#[derive(Debug, Clone)]
pub struct Filter {
    pub rt_out: bool,
    pub rt_in: bool,
    pub rt_affection: bool,
    pub all_thru: bool,
    pub midi_thru: bool,
    pub commonmsgs_thru: bool,
    pub commonmsgs_in: bool,
    pub sysex_thru: bool,
    pub sysex_in: bool,
    pub modemsgs_in: bool,
    pub timing_in_stop: bool,
    pub data_in_stop: bool,
    pub rec_measure_end: bool,
    pub allnotesoff_out: bool,
    pub bender_in: bool,
    /// Bit `c` set means channel `c` has a pending program change
    /// captured while stopped, to be replayed into the record stream
    /// on the next playback start.
    pub prchg_mask: u16,
    pub prchg_buf: [u8; 16],
}

impl Filter {
    /// Reset-time defaults, from `MPU401_Reset` in `snd_mpu401.c`.
    /// Everything not explicitly set there defaults to `false`/`0`.
    ///
    /// `midi_thru` starts `false` here rather than mirroring the
    /// source's `filter.midi_thru = 1` literally: the source also
    /// carries a second, separate thru-latch (`mpu->midi_thru`,
    /// reset to 0) that the "first command write turns thru on"
    /// quirk actually refers to. This crate folds both into the one
    /// field the spec describes, so it has to start off for the
    /// quirk in `command.rs` to do anything observable.
    pub fn reset(&mut self) {
        *self = Filter {
            rt_out: true,
            rt_in: false,
            rt_affection: true,
            all_thru: true,
            midi_thru: false,
            commonmsgs_thru: true,
            commonmsgs_in: false,
            sysex_thru: false,
            sysex_in: false,
            modemsgs_in: false,
            timing_in_stop: false,
            data_in_stop: false,
            rec_measure_end: true,
            allnotesoff_out: true,
            bender_in: false,
            prchg_mask: 0,
            prchg_buf: [0; 16],
        };
    }
}

impl Default for Filter {
    fn default() -> Self {
        let mut f = Filter {
            rt_out: false,
            rt_in: false,
            rt_affection: false,
            all_thru: false,
            midi_thru: false,
            commonmsgs_thru: false,
            commonmsgs_in: false,
            sysex_thru: false,
            sysex_in: false,
            modemsgs_in: false,
            timing_in_stop: false,
            data_in_stop: false,
            rec_measure_end: false,
            allnotesoff_out: false,
            bender_in: false,
            prchg_mask: 0,
            prchg_buf: [0; 16],
        };
        f.reset();
        f
    }
}
