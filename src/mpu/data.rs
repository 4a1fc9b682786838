//! Data-port submode dispatch (C7): command-byte continuation, WSD,
//! WSM, conductor parse, and track parse, in priority order.
//!
//! Ported from `MPU401_WriteData` in `snd_mpu401.c`. The original's
//! `track_req` guard is always false in practice (never set anywhere
//! in the source) and is dropped here rather than carried as dead
//! state.

use super::mode::Mode;
use super::state::DataOnOff;
use super::track::TrackKind;
use super::{Device, EOX};

impl Device {
    pub(crate) fn write_data(&mut self, val: u8) {
        if self.mode == Mode::Uart {
            self.sink.raw_byte(val);
            if val == 0xff {
                self.sink.reset();
            }
            return;
        }

        if let Some(opcode) = self.state.command_byte {
            self.state.command_byte = None;
            self.apply_command_byte_operand(opcode, val);
            return;
        }

        if self.state.wsd && !self.state.cond_req {
            self.write_wsd(val);
            return;
        }

        if self.state.wsm && !self.state.cond_req {
            self.write_wsm(val);
            return;
        }

        if self.state.cond_req {
            self.write_conductor(val);
            return;
        }

        self.write_track(val);
    }

    fn apply_command_byte_operand(&mut self, opcode: u8, val: u8) {
        match opcode {
            0xe0 => self.clock.set_tempo(val),
            0xe1 => self.clock.tempo_rel = val,
            0xe2 => self.clock.tempo_grad = val,
            0xe4 => self.clock.midimetro = val,
            0xe6 => self.clock.metromeas = val,
            0xe7 => self.clock.set_cth_interval(val),
            0xec => self.state.tmask = val,
            0xed => self.state.cmask = val,
            0xee => {
                self.state.midi_mask &= 0xff00;
                self.state.midi_mask |= val as u16;
            }
            0xef => {
                self.state.midi_mask &= 0x00ff;
                self.state.midi_mask |= (val as u16) << 8;
            }
            _ => {}
        }
    }

    /// Direct MIDI send (`spec.md` §4.3 step 2).
    fn write_wsd(&mut self, val: u8) {
        let track = self.state.track as usize;

        if self.state.wsd_start {
            self.state.wsd_start = false;
            self.wsd_pos = 0;
            match val & 0xf0 {
                0xc0 | 0xd0 => {
                    self.wsd_len = 2;
                    self.tracks[track].length = 2;
                    self.tracks[track].kind = TrackKind::MidiNorm;
                }
                0x80 | 0x90 | 0xa0 | 0xb0 | 0xe0 => {
                    self.wsd_len = 3;
                    self.tracks[track].length = 3;
                    self.tracks[track].kind = TrackKind::MidiNorm;
                }
                0xf0 => {
                    log::warn!("MPU-401 illegal WSD first byte {val:#04x}");
                    self.state.wsd = false;
                    self.state.track = self.state.old_track;
                    return;
                }
                _ => {
                    // Running-status continuation of the last track message.
                    self.wsd_pos = 1;
                    self.wsd_len = self.tracks[track].length;
                    self.tracks[track].kind = TrackKind::MidiNorm;
                }
            }
        }

        if self.wsd_pos < self.wsd_len {
            self.tracks[track].value[self.wsd_pos as usize] = val;
            self.wsd_pos += 1;
        }

        if self.wsd_pos == self.wsd_len {
            self.tracks[track].vlength = self.wsd_len;
            self.intelligent_out(track);
            self.state.wsd = false;
            self.state.track = self.state.old_track;
        }
    }

    /// Send-system-message stream (`spec.md` §4.3 step 3).
    fn write_wsm(&mut self, val: u8) {
        if self.state.wsd_start {
            self.state.wsd_start = false;
            self.wsm_pos = 0;
            self.wsm_len = match val {
                0xf2 => 3,
                0xf3 => 2,
                0xf6 => 1,
                0xf0 => 0,
                _ => {
                    self.state.wsm = false;
                    0
                }
            };
        } else if val & 0x80 != 0 {
            self.sink.raw_byte(EOX);
            self.state.wsm = false;
            return;
        }

        if self.wsm_len == 0 || self.wsm_pos < self.wsm_len {
            self.sink.raw_byte(val);
            self.wsm_pos += 1;
        }
        if self.wsm_pos == self.wsm_len {
            self.state.wsm = false;
        }
    }

    /// Conductor-track parser (`spec.md` §4.3 step 4).
    fn write_conductor(&mut self, val: u8) {
        match self.state.data_onoff {
            DataOnOff::Idle => {}
            DataOnOff::Stage0 => {
                self.condbuf.vlength = 0;
                if val < 0xf0 {
                    self.state.data_onoff = DataOnOff::Stage1;
                } else {
                    self.state.data_onoff = DataOnOff::Idle;
                    self.eoi_handler_dispatch();
                    return;
                }
                self.state.send_now = val == 0;
                self.condbuf.counter = val;
            }
            DataOnOff::Stage1 => {
                self.condbuf.kind = TrackKind::Mark;
                if !(val == 0xf8 || val == 0xf9 || val == 0xfc) {
                    self.condbuf.kind = TrackKind::Overflow;
                }
                // Mirrors the original's naming inversion: `T_COMMAND`
                // there is just "not one of the three system bytes".
                // We fold that into `Overflow` vs `Mark` pending a
                // real `Command` variant isn't needed -- the command
                // byte lives in `value[0]` either way.
                let pos = self.condbuf.vlength as usize;
                self.condbuf.value[pos] = val;
                self.condbuf.vlength += 1;

                if val & 0xf0 != 0xe0 {
                    self.eoi_handler_dispatch();
                } else {
                    self.state.data_onoff = DataOnOff::Stage2;
                }
            }
            DataOnOff::Stage2 => {
                let pos = self.condbuf.vlength as usize;
                self.condbuf.value[pos] = val;
                self.condbuf.vlength += 1;
                self.eoi_handler_dispatch();
            }
        }
    }

    /// Track parser (`spec.md` §4.3 step 5, the default submode).
    fn write_track(&mut self, val: u8) {
        match self.state.data_onoff {
            DataOnOff::Idle => {}
            DataOnOff::Stage0 => {
                if val < 0xf0 {
                    self.state.data_onoff = DataOnOff::Stage1;
                } else {
                    self.state.data_onoff = DataOnOff::Idle;
                    self.eoi_handler_dispatch();
                    return;
                }
                self.state.send_now = val == 0;
                let track = self.state.track as usize;
                self.tracks[track].counter = val;
            }
            DataOnOff::Stage1 => {
                let track = self.state.track as usize;
                self.tracks[track].vlength += 1;
                let mut posd = self.tracks[track].vlength;
                if posd == 1 {
                    let length = match val & 0xf0 {
                        0xf0 => {
                            self.tracks[track].sys_val = val;
                            if val > 0xf7 {
                                self.tracks[track].kind = TrackKind::Mark;
                                if val == 0xf9 {
                                    self.clock.measure_counter = 0;
                                }
                            } else {
                                self.tracks[track].kind = TrackKind::Overflow;
                            }
                            1
                        }
                        0xc0 | 0xd0 => {
                            self.tracks[track].kind = TrackKind::MidiNorm;
                            self.tracks[track].length = 2;
                            2
                        }
                        0x80 | 0x90 | 0xa0 | 0xb0 | 0xe0 => {
                            self.tracks[track].kind = TrackKind::MidiNorm;
                            self.tracks[track].length = 3;
                            3
                        }
                        _ => {
                            // Running-status continuation.
                            posd += 1;
                            self.tracks[track].vlength += 1;
                            self.tracks[track].kind = TrackKind::MidiNorm;
                            self.tracks[track].length
                        }
                    };
                    self.tracks[track].length = length;
                }

                if !(posd == 1 && val >= 0xf0) {
                    self.tracks[track].value[(posd - 1) as usize] = val;
                }

                if posd == self.tracks[track].length {
                    self.eoi_handler_dispatch();
                }
            }
            DataOnOff::Stage2 => {}
        }
    }
}
