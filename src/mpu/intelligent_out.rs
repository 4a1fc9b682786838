//! Track-buffer dispatch into outbound MIDI, with reference-table note
//! tracking (C4.4/C4.5).
//!
//! Ported from `MPU401_IntelligentOut`/`MPU401_NotesOff` in
//! `snd_mpu401.c`.

use super::track::TrackKind;
use super::Device;

impl Device {
    /// Emit `self.tracks[track]`'s (or the conductor's, via
    /// [`Device::intelligent_out_conductor`]) pending message,
    /// applying note-on/off retrigger suppression from the reference
    /// tables.
    pub(crate) fn intelligent_out(&mut self, track: usize) {
        let buf = self.tracks[track].clone();
        self.intelligent_out_buffer(&buf);
    }

    pub(crate) fn intelligent_out_buffer(&mut self, buf: &super::TrackBuffer) {
        match buf.kind {
            TrackKind::Overflow => {}
            TrackKind::Mark => {
                if buf.sys_val == 0xfc {
                    self.sink.realtime_byte(buf.sys_val);
                }
            }
            TrackKind::MidiNorm => {
                let channel = buf.value[0] & 0x0f;
                let msg = buf.value[0] & 0xf0;
                let key = buf.value[1] & 0x7f;
                let chrefnum = self.reference.slot_for_channel(channel);

                let mut send = true;
                let mut retrigger = false;

                match msg {
                    0x80 => {
                        if self.reference.inputref[channel as usize].key.get(key) {
                            send = false;
                        }
                        if self.reference.chanref[chrefnum].on
                            && !self.reference.chanref[chrefnum].key.get(key)
                        {
                            send = false;
                        }
                        self.reference.chanref[chrefnum].key.clear_key(key);
                    }
                    0x90 => {
                        if self.reference.inputref[channel as usize].key.get(key) {
                            retrigger = true;
                        }
                        if self.reference.chanref[chrefnum].on
                            && self.reference.chanref[chrefnum].key.get(key)
                        {
                            retrigger = true;
                        }
                        self.reference.chanref[chrefnum].key.set(key);
                    }
                    0xb0 => {
                        if buf.value[1] == 123 {
                            self.notes_off(channel);
                            return;
                        }
                    }
                    _ => {}
                }

                if retrigger {
                    self.sink.raw_byte(0x80 | channel);
                    self.sink.raw_byte(key);
                    self.sink.raw_byte(0);
                }
                if send {
                    for &b in &buf.value[..buf.vlength.max(buf.length) as usize] {
                        self.sink.raw_byte(b);
                    }
                }
            }
        }
    }

    /// `UpdateTrack`: dispatch track `t`'s buffer and reload it for
    /// the next cycle, or mark the measure request pending if playback
    /// has fully drained (`spec.md` §4.6 step 2).
    pub(crate) fn update_track(&mut self, t: usize) {
        self.intelligent_out(t);
        if self.state.amask & (1 << t) != 0 {
            self.tracks[t].reload_after_dispatch();
            self.state.req_mask |= 1 << t;
        } else if self.state.amask == 0 && !self.state.conductor {
            self.state.req_mask |= 1 << 12;
        }
    }

    /// `MPU401_NotesOff`: either a single all-notes-off control change
    /// (the common case) or, when the channel's reference table has
    /// pending keys the input side doesn't know about, individual
    /// note-offs per pressed key.
    pub(crate) fn notes_off(&mut self, channel: u8) {
        let slot = self.reference.slot_for_channel(channel);
        let input = &self.reference.inputref[channel as usize];
        let input_has_keys = input.key.iter_set().next().is_some();

        if self.filter.allnotesoff_out && !input_has_keys {
            self.reference.chanref[slot].key.clear_all();
            self.sink.raw_byte(0xb0 | channel);
            self.sink.raw_byte(123);
            self.sink.raw_byte(0);
        } else if self.reference.chanref[slot].on {
            for key in 0u8..128 {
                let chan_has = self.reference.chanref[slot].key.get(key);
                let input_has = self.reference.inputref[channel as usize].key.get(key);
                if chan_has && !input_has {
                    self.sink.raw_byte(0x80 | channel);
                    self.sink.raw_byte(key);
                    self.sink.raw_byte(0);
                }
                self.reference.chanref[slot].key.clear_key(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpu::track::TrackBuffer;
    use crate::test_support::{NullIrq, NullScheduler, RecordingSink};
    use crate::Config;

    fn device_with_recorder() -> (Device, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let sink = RecordingSink::default();
        let log = sink.log();
        let dev = Device::new(
            Config::default(),
            Box::new(sink),
            Box::new(NullIrq::default()),
            Box::new(NullScheduler::default()),
        );
        (dev, log)
    }

    #[test]
    fn note_on_then_off_emits_both_without_retrigger() {
        let (mut dev, log) = device_with_recorder();
        let mut buf = TrackBuffer::default();
        buf.kind = TrackKind::MidiNorm;
        buf.value = [0x90, 0x3c, 0x40];
        buf.length = 3;
        buf.vlength = 3;
        dev.intelligent_out_buffer(&buf);

        buf.value = [0x80, 0x3c, 0x00];
        dev.intelligent_out_buffer(&buf);

        let out = log.lock().unwrap().clone();
        assert_eq!(out, vec![0x90, 0x3c, 0x40, 0x80, 0x3c, 0x00]);
    }

    #[test]
    fn repeated_note_on_retriggers() {
        let (mut dev, log) = device_with_recorder();
        dev.reference.chanref[0].on = true;
        let mut buf = TrackBuffer::default();
        buf.kind = TrackKind::MidiNorm;
        buf.value = [0x90, 0x3c, 0x40];
        buf.length = 3;
        buf.vlength = 3;
        dev.intelligent_out_buffer(&buf);
        dev.intelligent_out_buffer(&buf);

        let out = log.lock().unwrap().clone();
        assert_eq!(out, vec![0x90, 0x3c, 0x40, 0x80, 0x3c, 0x00, 0x90, 0x3c, 0x40]);
    }
}
