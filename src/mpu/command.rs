//! Command-port opcode dispatch (C6).
//!
//! Ported from `MPU401_WriteCommand` in `snd_mpu401.c`; the roughly
//! sixty opcode families are grouped the same way the original's
//! `if`/`switch` cascade groups them.

use super::mode::Mode;
use super::state::RecState;
use super::track::TrackKind;
use super::{Device, ACK, END, REVISION, VERSION};

use super::clock::MPU_CLOCK_BASE;

impl Device {
    pub(crate) fn write_command(&mut self, val: u8) {
        if !self.config.intelligent_capable && val != 0xff && val != 0x3f {
            return;
        }

        if self.mode == Mode::Uart && val != 0xff {
            return;
        }

        if self.state.reset {
            if self.state.cmd_pending != 0 || val != 0xff {
                self.state.cmd_pending = val as u16 + 1;
                return;
            }
            self.scheduler.disable(crate::scheduler::TimerKind::ResetDone);
            self.state.reset = false;
        }

        self.filter.midi_thru = true;

        if val <= 0x2f {
            self.dispatch_sequencer_control(val);
            return;
        }

        if (0xa0..=0xa7).contains(&val) && self.state.cmask & (1 << (val & 7)) != 0 {
            let counter = self.tracks[(val & 7) as usize].counter;
            self.queue_host(counter);
        }

        if (0xd0..=0xd7).contains(&val) {
            self.state.old_track = self.state.track;
            self.state.track = val & 7;
            self.state.wsd = true;
            self.state.wsm = false;
            self.state.wsd_start = true;
            self.queue_ack();
            return;
        }

        if (0x40..0x80).contains(&val) {
            let slot = ((val >> 4) - 4) as usize;
            self.reference.set_reference_channel(slot, val & 0x0f);
            self.reference.chanref[slot].on = true;
            self.queue_ack();
            return;
        }

        match val {
            0x30 => self.filter.allnotesoff_out = false,
            0x32 => self.filter.rt_out = false,
            0x33 => {
                self.filter.all_thru = false;
                self.filter.commonmsgs_thru = false;
                self.filter.midi_thru = false;
                for i in &mut self.reference.inputref {
                    i.on = false;
                    i.key.clear_all();
                }
            }
            0x34 => self.filter.timing_in_stop = true,
            0x35 => self.filter.modemsgs_in = true,
            0x37 => self.filter.sysex_thru = true,
            0x38 => self.filter.commonmsgs_in = true,
            0x39 => self.filter.rt_in = true,

            0x80 => {
                if self.clock.active {
                    self.scheduler.arm(
                        crate::scheduler::TimerKind::Event,
                        self.clock.event_period_usec(),
                    );
                }
            }
            0x82 => {}

            0x86 | 0x87 => self.filter.bender_in = val & 1 != 0,
            0x88 | 0x89 => {
                let on = val & 1 != 0;
                self.filter.midi_thru = on;
                self.reference.mirror_midi_thru(on);
            }
            0x8a | 0x8b => self.filter.data_in_stop = val & 1 != 0,
            0x8c | 0x8d => self.filter.rec_measure_end = val & 1 != 0,
            0x8e | 0x8f => self.state.cond_set = val & 1 != 0,
            0x90 | 0x91 => self.filter.rt_affection = val & 1 != 0,

            0x94 => {
                self.state.clock_to_host = false;
                self.stop_clock();
            }
            0x95 => {
                self.state.clock_to_host = true;
                self.start_clock();
            }
            0x96 | 0x97 => {
                self.filter.sysex_in = val & 1 != 0;
                if self.filter.sysex_in {
                    self.filter.sysex_thru = false;
                }
            }
            0x98..=0x9f => {
                let slot = ((val - 0x98) >> 1) as usize;
                self.reference.set_chanref_enabled(slot, val & 1 != 0);
            }

            0xdf => {
                self.state.wsd = false;
                self.state.wsm = true;
                self.state.wsd_start = true;
            }

            0xc2..=0xc8 => {
                self.clock.timebase = MPU_CLOCK_BASE[(val - 0xc2) as usize];
            }

            0xe0 | 0xe1 | 0xe2 | 0xe4 | 0xe6 | 0xe7 | 0xec | 0xed | 0xee | 0xef => {
                self.state.command_byte = Some(val);
            }

            0xab => {
                self.queue_host(ACK);
                self.queue_host(0);
                return;
            }
            0xac => {
                self.queue_host(ACK);
                self.queue_host(VERSION);
                return;
            }
            0xad => {
                self.queue_host(ACK);
                self.queue_host(REVISION);
                return;
            }
            0xaf => {
                self.queue_host(ACK);
                self.queue_host(self.clock.tempo);
                return;
            }

            0xb1 => self.clock.tempo_rel = 0x40,

            0xb8 | 0xb9 => {
                for channel in 0..16u8 {
                    self.notes_off(channel);
                }
                self.state.last_rtcmd = 0;
                for t in &mut self.tracks {
                    t.counter = 0;
                    t.kind = TrackKind::Overflow;
                }
                self.condbuf.counter = 0;
                self.condbuf.kind = TrackKind::Overflow;
                if self.state.conductor != self.state.cond_set {
                    self.state.cond_req = false;
                }
                self.state.amask = self.state.tmask;
                self.state.conductor = self.state.cond_set;
                self.clock.cth_counter = 0;
                self.clock.cth_old = 0;
                self.clock.measure_counter = 0;
                self.clock.meas_old = 0;
                self.state.req_mask = 0;
                self.state.irq_pending = true;
            }

            0xba => self.clock.rec_counter = 0,

            0xff => {
                self.scheduler.arm(
                    crate::scheduler::TimerKind::ResetDone,
                    super::RESET_BUSY_USEC,
                );
                self.state.reset = true;
                if self.mode == Mode::Uart {
                    self.reset();
                    return;
                }
                self.reset();
            }

            0x3f => self.mode = Mode::Uart,

            _ => {}
        }

        self.queue_ack();
    }

    /// `val <= 0x2f`: combined realtime/playback/recording dispatch.
    fn dispatch_sequencer_control(&mut self, val: u8) {
        let rt_sel = val & 0x03;
        let mut send_prchg = false;

        match rt_sel {
            1 => {
                self.state.last_rtcmd = 0xfc;
                self.emit_realtime_gated(0xfc);
                self.clock.meas_old = self.clock.measure_counter;
                self.clock.cth_old = self.clock.cth_counter;
            }
            2 => {
                self.state.last_rtcmd = 0xfa;
                // Reproduced verbatim: the original swaps 0xfa/0xfb here
                // (spec.md design note c).
                self.emit_realtime_gated(0xfb);
                self.clock.measure_counter = 0;
                self.clock.meas_old = 0;
                self.clock.cth_counter = 0;
                self.clock.cth_old = 0;
            }
            3 => {
                self.state.last_rtcmd = 0xfc;
                self.emit_realtime_gated(0xfa);
                self.clock.measure_counter = self.clock.meas_old;
                self.clock.cth_counter = self.clock.cth_old;
            }
            _ => {}
        }

        match val & 0x30 {
            0x00 => {
                if rt_sel >= 2 && self.filter.rt_affection && self.state.rec == RecState::RecStb {
                    self.start_clock();
                    self.state.rec = RecState::RecOn;
                    if self.filter.prchg_mask != 0 {
                        send_prchg = true;
                    }
                }
            }
            0x10 => {
                self.state.rec = RecState::RecOff;
                self.stop_clock();
                self.queue_host(ACK);
                self.queue_host(self.clock.rec_counter);
                self.queue_host(END);
                self.filter.prchg_mask = 0;
                self.clock.rec_counter = 0;
                return;
            }
            0x20 => {
                if self.state.rec != RecState::RecOn {
                    self.clock.rec_counter = 0;
                    self.state.rec = RecState::RecStb;
                }
                if self.state.last_rtcmd == 0xfa || self.state.last_rtcmd == 0xfb {
                    self.clock.rec_counter = 0;
                    self.start_clock();
                    self.state.rec = RecState::RecOn;
                    if self.filter.prchg_mask != 0 {
                        send_prchg = true;
                    }
                }
            }
            _ => {}
        }

        match val & 0x0c {
            0x04 => {
                self.state.playing = false;
                self.stop_clock();
                for channel in 0..16u8 {
                    self.notes_off(channel);
                }
                self.filter.prchg_mask = 0;
            }
            0x08 => {
                self.start_clock();
                self.state.playing = true;
                self.clear_host_queue();
            }
            _ => {}
        }

        self.queue_ack();

        if (val == 0x20 || val == 0x26) && self.state.rec == RecState::RecOn {
            let rec_cnt = self.clock.rec_counter;
            self.record_queue_push(&[rec_cnt]);
        }

        if send_prchg {
            for channel in 0..16u8 {
                if self.filter.prchg_mask & (1 << channel) != 0 {
                    let recmsg = [
                        self.clock.rec_counter,
                        0xc0 | channel,
                        self.filter.prchg_buf[channel as usize],
                    ];
                    self.record_queue_push(&recmsg);
                    self.filter.prchg_mask &= !(1 << channel);
                }
            }
        }
    }

    fn emit_realtime_gated(&mut self, byte: u8) {
        if self.filter.rt_out {
            self.sink.realtime_byte(byte);
        } else {
            self.sink.raw_byte(byte);
        }
    }
}
