//! The periodic tempo-driven event tick and the EOI (end-of-input)
//! handler that serialises `req_mask` to the host (C8).
//!
//! Ported from `MPU401_Event`/`MPU401_EOIHandlerDispatch`/
//! `MPU401_EOIHandler` in `snd_mpu401.c`.

use super::mode::Mode;
use super::state::RecState;
use super::Device;
use crate::scheduler::TimerKind;

impl Device {
    /// `MPU401_Event`: one tempo tick. Re-arms itself for the next
    /// period unless the device has left intelligent mode.
    pub(crate) fn on_event_tick(&mut self) {
        if self.mode == Mode::Uart {
            return;
        }

        let event_delay = self.clock.event_period_usec();

        if self.state.irq_pending && self.clock.active {
            self.scheduler.advance(TimerKind::Event, event_delay);
            return;
        }

        if self.state.playing {
            for i in 0..8usize {
                if self.state.amask & (1 << i) != 0 {
                    if self.tracks[i].counter > 0 {
                        self.tracks[i].counter -= 1;
                    }
                    if self.tracks[i].counter == 0 {
                        self.update_track(i);
                    }
                }
            }
            if self.state.conductor {
                if self.condbuf.counter > 0 {
                    self.condbuf.counter -= 1;
                }
                if self.condbuf.counter == 0 {
                    self.condbuf.vlength = 0;
                    self.condbuf.counter = 0xf0;
                    self.state.req_mask |= 1 << 9;
                }
            }
        }

        if self.state.clock_to_host {
            self.clock.cth_counter += 1;
            if self.clock.cth_counter >= self.clock.cth_rate[self.clock.cth_mode as usize] {
                self.clock.cth_counter = 0;
                self.clock.cth_mode = (self.clock.cth_mode + 1) % 4;
                self.state.req_mask |= 1 << 13;
            }
        }

        if self.state.rec == RecState::RecOn {
            self.clock.rec_counter += 1;
            if self.clock.rec_counter >= 240 {
                self.clock.rec_counter = 0;
                self.state.req_mask |= 1 << 8;
            }
        }

        if self.state.playing || self.state.rec == RecState::RecOn {
            let max_meascnt = self.clock.max_measure_count();
            if max_meascnt > 0 {
                self.clock.measure_counter += 1;
                if self.clock.measure_counter >= max_meascnt {
                    if self.filter.rt_out {
                        self.sink.realtime_byte(0xf8);
                    }
                    self.clock.measure_counter = 0;
                    if self.filter.rec_measure_end && self.state.rec == RecState::RecOn {
                        self.state.req_mask |= 1 << 12;
                    }
                }
            }
        }

        if !self.state.irq_pending && self.state.req_mask != 0 {
            self.eoi_handler();
        }

        self.scheduler.advance(TimerKind::Event, event_delay);
    }

    /// `MPU401_EOIHandlerDispatch`: either defer to the 60-µs one-shot
    /// (`send_now` is set) or invoke the handler immediately.
    pub(crate) fn eoi_handler_dispatch(&mut self) {
        if self.state.send_now {
            self.state.eoi_scheduled = true;
            self.scheduler.arm(TimerKind::Eoi, super::EOI_DELAY_USEC);
        } else if !self.state.eoi_scheduled {
            self.eoi_handler();
        }
    }

    /// `MPU401_EOIHandler`: drains `req_mask`'s lowest set bit into the
    /// host queue as a `0xF0+i` marker.
    pub(crate) fn eoi_handler(&mut self) {
        self.state.eoi_scheduled = false;
        if self.state.send_now {
            self.state.send_now = false;
            if self.state.cond_req {
                self.condbuf.counter = 0xf0;
                self.state.req_mask |= 1 << 9;
            } else {
                let track = self.state.track as usize;
                self.update_track(track);
            }
        }

        if self.state.rec_copy || !self.state.sysex_in_finished {
            return;
        }

        self.state.irq_pending = false;
        if self.state.req_mask == 0 {
            return;
        }

        for i in 0..16u16 {
            if self.state.req_mask & (1 << i) != 0 {
                self.queue_host(0xf0 + i as u8);
                self.state.req_mask &= !(1 << i);
                break;
            }
        }
    }
}
