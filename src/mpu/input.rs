//! Inbound MIDI message and SysEx routing: thru, filtering, and
//! recording (C9).
//!
//! Ported from `MPU401_InputMsg`/`MPU401_InputSysex` in
//! `snd_mpu401.c`.

use super::mode::Mode;
use super::state::RecState;
use super::Device;

impl Device {
    /// Route an inbound SysEx chunk. Returns the number of bytes from
    /// `buffer` that could *not* be accepted -- the caller should
    /// retry with the residual once more room is available.
    pub fn input_sysex(&mut self, buffer: &[u8], abort: bool) -> usize {
        if self.mode == Mode::Uart {
            for &b in buffer {
                self.queue_host(b);
            }
            return 0;
        }

        if self.filter.sysex_in {
            if abort {
                self.state.sysex_in_finished = true;
                self.record_queue.clear();
                return 0;
            }
            if self.state.sysex_in_finished {
                if self.record_queue.is_full() {
                    return buffer.len();
                }
                self.record_queue_push(&[0xff]);
                self.state.sysex_in_finished = false;
                self.clock.rec_counter = 0;
            }
            if self.record_queue.is_full() {
                return buffer.len();
            }
            let available = super::queues::RECORD_QUEUE_CAPACITY - self.record_queue.len();
            if available >= buffer.len() {
                self.record_queue_push(buffer);
                0
            } else {
                self.record_queue_push(&buffer[..available]);
                if self.state.sysex_in_finished {
                    0
                } else {
                    buffer.len() - available
                }
            }
        } else if self.filter.sysex_thru && self.filter.midi_thru {
            self.sink.raw_byte(0xf0);
            for &b in buffer {
                self.sink.raw_byte(b);
            }
            0
        } else {
            0
        }
    }

    /// Route an inbound 1..3-byte MIDI message, expanding running
    /// status against the last remembered status byte.
    pub fn input_msg(&mut self, msg: &[u8]) {
        if !self.state.sysex_in_finished {
            log::trace!("MPU-401 input message dropped: SysEx in progress");
            return;
        }

        let mut full = [0u8; 3];
        if msg[0] < 0x80 {
            full[0] = self.old_msg;
            full[1] = msg[0];
            full[2] = msg.get(1).copied().unwrap_or(0);
        } else {
            full[..msg.len()].copy_from_slice(msg);
        }
        let len = if msg[0] < 0x80 { msg.len() + 1 } else { msg.len() };

        if self.mode != Mode::Intelligent {
            for &b in &full[..len] {
                self.queue_host(b);
            }
            return;
        }

        self.old_msg = full[0];
        let chan = full[0] & 0x0f;
        let chrefnum = self.reference.slot_for_channel(chan);
        let key = full[1] & 0x7f;

        let mut send = true;
        let mut send_thru = false;
        let mut retrigger_thru = false;

        if full[0] < 0xf0 {
            if (self.state.midi_mask & (1 << chan) == 0) && self.filter.all_thru {
                send_thru = true;
            } else if self.filter.midi_thru {
                send_thru = true;
            }

            match full[0] & 0xf0 {
                0x80 => {
                    if send_thru {
                        if self.reference.chanref[chrefnum].on
                            && self.reference.chanref[chrefnum].key.get(key)
                        {
                            send_thru = false;
                        }
                        if !self.filter.midi_thru {
                            // fallthrough: neither branch below applies
                        } else {
                            if !self.reference.inputref[chan as usize].key.get(key) {
                                send_thru = false;
                            }
                            self.reference.inputref[chan as usize].key.clear_key(key);
                        }
                    }
                }
                0x90 => {
                    if send_thru {
                        if self.reference.chanref[chrefnum].on
                            && self.reference.chanref[chrefnum].key.get(key)
                        {
                            retrigger_thru = true;
                        }
                        if self.filter.midi_thru {
                            if self.reference.inputref[chan as usize].key.get(key) {
                                retrigger_thru = true;
                            }
                            self.reference.inputref[chan as usize].key.set(key);
                        }
                    }
                }
                0xb0 => {
                    if full[1] >= 120 {
                        send_thru = false;
                        if full[1] == 123 {
                            for k in 0u8..128 {
                                let suppressed = self.reference.chanref[chrefnum].on
                                    && self.reference.chanref[chrefnum].key.get(k);
                                if !suppressed {
                                    if self.reference.inputref[chan as usize].on
                                        && self.reference.inputref[chan as usize].key.get(k)
                                    {
                                        self.sink.raw_byte(0x80 | chan);
                                        self.sink.raw_byte(k);
                                        self.sink.raw_byte(0);
                                    }
                                    self.reference.inputref[chan as usize].key.clear_key(k);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if full[0] >= 0xf0 || self.state.midi_mask & (1 << chan) != 0 {
            send = self.route_non_thru_categories(&full, len, chan);
            if full[0] >= 0xf0 && self.filter.rt_affection {
                self.apply_realtime_affection(full[0]);
                return;
            }
        }

        if send_thru && self.filter.midi_thru {
            if retrigger_thru {
                self.sink.raw_byte(0x80 | chan);
                self.sink.raw_byte(full[1]);
                self.sink.raw_byte(full[2]);
            }
            for &b in &full[..len] {
                self.sink.raw_byte(b);
            }
        }

        if send {
            if self.state.rec == RecState::RecOn {
                let rec_counter = self.clock.rec_counter;
                self.record_queue_push(&[rec_counter, full[0], full[1], full[2]]);
                self.clock.rec_counter = 0;
            } else if self.filter.data_in_stop {
                if self.filter.timing_in_stop {
                    self.record_queue_push(&[0, full[0], full[1], full[2]]);
                } else {
                    self.record_queue_push(&[full[0], full[1], full[2], 0]);
                }
            }
        }
    }

    /// The second `msg[0] & 0xf0` classification in
    /// `MPU401_InputMsg`: aftertouch/CC/program-change/pitch-bend/
    /// system-message filtering, record-queue enqueue for system
    /// bytes. Returns whether the thru/record "send" flag should
    /// remain set afterward.
    fn route_non_thru_categories(&mut self, full: &[u8; 3], len: usize, chan: u8) -> bool {
        let mut send = true;
        match full[0] & 0xf0 {
            0xa0 => {
                if !self.filter.bender_in {
                    send = false;
                }
            }
            0xb0 => {
                if !self.filter.bender_in && full[1] < 64 {
                    send = false;
                }
                if full[1] >= 120 && self.filter.modemsgs_in {
                    send = true;
                }
            }
            0xc0 => {
                if self.state.rec != RecState::RecOn && !self.filter.data_in_stop {
                    self.filter.prchg_buf[chan as usize] = full[1];
                    self.filter.prchg_mask |= 1 << chan;
                }
            }
            0xd0 | 0xe0 => {
                if !self.filter.bender_in {
                    send = false;
                }
            }
            0xf0 => {
                if full[0] == 0xf8 {
                    send = false;
                } else if full[0] > 0xf8 {
                    if !(self.filter.rt_in && (0xfa..=0xfc).contains(&full[0])) {
                        self.record_queue_push(&[0xff, full[0]]);
                        send = false;
                    }
                } else {
                    send = false;
                    if full[0] == 0xf2 || full[0] == 0xf3 || full[0] == 0xf6 {
                        if self.filter.commonmsgs_in {
                            send = true;
                        }
                        if self.filter.commonmsgs_thru {
                            for &b in &full[..len] {
                                self.sink.raw_byte(b);
                            }
                        }
                    }
                }
                if send {
                    self.record_queue_push(&[0xff, full[0], full[1], full[2]]);
                }
            }
            _ => {}
        }
        send
    }

    /// `spec.md` §4.7's realtime-affection synthesis: 0xFA/0xFB/0xFC
    /// become internal Start/Continue/Stop commands; 0xF2/0xF3 clear
    /// the play counters. ACK is suppressed via `block_ack`.
    fn apply_realtime_affection(&mut self, byte: u8) {
        match byte {
            0xf2 | 0xf3 => {
                self.state.block_ack = true;
                self.write_command(0xb8);
            }
            0xfa => {
                self.state.block_ack = true;
                self.write_command(0x0a);
                if self.filter.rt_out {
                    self.sink.realtime_byte(byte);
                }
            }
            0xfb => {
                self.state.block_ack = true;
                self.write_command(0x0b);
                if self.filter.rt_out {
                    self.sink.realtime_byte(byte);
                }
            }
            0xfc => {
                self.state.block_ack = true;
                self.write_command(0x0d);
                if self.filter.rt_out {
                    self.sink.realtime_byte(byte);
                }
            }
            _ => {}
        }
    }
}
