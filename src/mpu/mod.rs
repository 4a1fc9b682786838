//! The device core: composes the queues, tables, decoders and engine
//! into the two-port surface a host attaches to its I/O bus.
//!
//! Ported from `mpu_t` plus `mpu401_read`/`mpu401_write`/`mpu401_init`
//! in `snd_mpu401.c`; trait-object composition modelled on how
//! `c64.rs` wires a boxed [`crate::MidiSink`] into its CIA/SID bank.

mod clock;
mod command;
mod data;
mod event;
mod filter;
mod input;
mod intelligent_out;
pub mod mode;
mod queues;
mod reference;
mod state;
mod track;

use crate::config::Config;
use crate::irq::IrqLine;
use crate::scheduler::{Scheduler, TimerKind};
use crate::sink::MidiSink;

use clock::ClockState;
pub use filter::Filter;
use mode::Mode;
use queues::{HostQueue, PushOutcome, RecordQueue};
pub use reference::{ChannelRef, InputRef, ReferenceBank};
use state::{DataOnOff, RecState, StateFlags};
pub use track::{TrackBuffer, TrackKind};

/// Offset of the data port relative to the device's base address.
pub const DATA_PORT_OFFSET: u16 = 0;
/// Offset of the command/status port relative to the device's base address.
pub const STATUS_PORT_OFFSET: u16 = 1;

const ACK: u8 = 0xFE;
const END: u8 = 0xFF;
const CLOCK: u8 = 0xF8;
const COMMAND_REQ: u8 = 0xF9;
const EOX: u8 = 0xF7;

/// The documented MPU-401 hardware identification bytes returned by
/// opcodes `0xAC`/`0xAD`. The retrieved source did not include the
/// header defining these; they are carried over from the publicly
/// documented MPU-401 command set.
pub const VERSION: u8 = 0x15;
pub const REVISION: u8 = 0x00;

const STATUS_OUTPUT_NOT_READY: u8 = 0x40;
const STATUS_INPUT_NOT_READY: u8 = 0x80;

const RESET_BUSY_USEC: u64 = 14;
const EOI_DELAY_USEC: u64 = 60;

/// The Roland MPU-401 intelligent-mode protocol engine.
///
/// Owns no I/O ports, timers, or MIDI transport of its own: those are
/// supplied at construction time as boxed trait objects and driven by
/// the host through [`Device::read`], [`Device::write`],
/// [`Device::on_timer`], [`Device::input_msg`] and
/// [`Device::input_sysex`].
pub struct Device {
    mode: Mode,
    filter: Filter,
    clock: ClockState,
    reference: ReferenceBank,
    tracks: [TrackBuffer; 8],
    condbuf: TrackBuffer,
    state: StateFlags,
    host_queue: HostQueue,
    record_queue: RecordQueue,
    old_msg: u8,
    /// Expected length and bytes-so-far for the in-progress WSD
    /// message; not part of `spec.md`'s named `StateFlags` but needed
    /// to carry state between data-port writes the way the original's
    /// function-local `static length`/`cnt` do.
    wsd_len: u8,
    wsd_pos: u8,
    /// Same role for the in-progress WSM (system-exclusive) stream.
    wsm_len: u8,
    wsm_pos: u8,
    config: Config,

    sink: Box<dyn MidiSink>,
    irq: Box<dyn IrqLine>,
    scheduler: Box<dyn Scheduler>,
}

impl Device {
    /// Build a device starting in UART mode, as real MPU-401 hardware
    /// does (`mpu401_init`). `config.receive_input` gates whether the
    /// host should route inbound MIDI to [`Device::input_msg`]/
    /// [`Device::input_sysex`] at all -- callers that set it false
    /// should simply not call them.
    pub fn new(
        config: Config,
        sink: Box<dyn MidiSink>,
        irq: Box<dyn IrqLine>,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let mut dev = Device {
            mode: Mode::Uart,
            filter: Filter::default(),
            clock: ClockState::default(),
            reference: ReferenceBank::default(),
            tracks: Default::default(),
            condbuf: TrackBuffer::default(),
            state: StateFlags::default(),
            host_queue: HostQueue::new(),
            record_queue: RecordQueue::new(),
            old_msg: 0,
            wsd_len: 0,
            wsd_pos: 0,
            wsm_len: 0,
            wsm_pos: 0,
            config,
            sink,
            irq,
            scheduler,
        };
        dev.reset();
        dev
    }

    /// Read one byte from `offset` (must be [`DATA_PORT_OFFSET`] or
    /// [`STATUS_PORT_OFFSET`]).
    pub fn read(&mut self, offset: u16) -> u8 {
        match offset & 1 {
            0 => self.read_data(),
            _ => self.read_status(),
        }
    }

    /// Write one byte to `offset` (must be [`DATA_PORT_OFFSET`] or
    /// [`STATUS_PORT_OFFSET`]).
    pub fn write(&mut self, offset: u16, val: u8) {
        match offset & 1 {
            0 => self.write_data(val),
            _ => self.write_command(val),
        }
    }

    /// Host timer callback dispatch (`spec.md` §6 "Timer contract").
    pub fn on_timer(&mut self, timer: TimerKind) {
        match timer {
            TimerKind::Event => self.on_event_tick(),
            TimerKind::Eoi => self.eoi_handler(),
            TimerKind::ResetDone => self.on_reset_done(),
        }
    }

    fn read_status(&mut self) -> u8 {
        let mut ret = 0x3f;
        if self.state.cmd_pending != 0 {
            ret |= STATUS_OUTPUT_NOT_READY;
        }
        if self.host_queue.is_empty() {
            ret |= STATUS_INPUT_NOT_READY;
        }
        ret
    }

    fn read_data(&mut self) -> u8 {
        let ret = self.host_queue.pop().unwrap_or(ACK);

        if !self.config.intelligent_capable {
            return ret;
        }

        if self.state.rec_copy && self.record_queue.is_empty() {
            self.state.rec_copy = false;
            self.eoi_handler();
            return ret;
        }

        if self.host_queue.is_empty() {
            self.irq.deassert();
        }

        if (0xf0..=0xf7).contains(&ret) {
            self.state.track = ret & 7;
            self.state.data_onoff = DataOnOff::Stage0;
            self.state.cond_req = false;
        }

        if ret == COMMAND_REQ {
            self.state.data_onoff = DataOnOff::Stage0;
            self.state.cond_req = true;
            if self.condbuf.kind != TrackKind::Overflow {
                self.state.block_ack = true;
                let op = self.condbuf.value[0];
                self.write_command(op);
                if self.state.command_byte.is_some() {
                    let arg = self.condbuf.value[1];
                    self.write_data(arg);
                }
            }
            self.condbuf.kind = TrackKind::Overflow;
        }

        if ret == END || ret == CLOCK || ret == ACK {
            self.state.data_onoff = DataOnOff::Idle;
            self.eoi_handler_dispatch();
        }

        ret
    }

    /// Push a byte to the host queue, asserting the IRQ line on the
    /// first byte into an empty queue (full intelligent-capable
    /// hardware only, per the queue-wide invariant in `spec.md` §3 --
    /// the reduced, UART-only clones never raise this IRQ regardless
    /// of the device's current runtime [`Mode`]). A pending
    /// `block_ack` suppresses exactly the next byte, one-shot,
    /// regardless of what it is: synthesized conductor commands use it
    /// to swallow the ACK a recursive `write_command`/`write_data`
    /// call would otherwise queue.
    pub(crate) fn queue_host(&mut self, byte: u8) {
        if self.state.block_ack {
            self.state.block_ack = false;
            return;
        }
        match self.host_queue.push(byte) {
            PushOutcome::Inserted { was_empty } => {
                if was_empty && self.config.intelligent_capable {
                    self.state.irq_pending = true;
                    self.irq.assert();
                }
            }
            PushOutcome::Dropped => {
                log::warn!("MPU-401 host queue overflow, dropping byte {byte:#04x}");
            }
        }
    }

    pub(crate) fn queue_ack(&mut self) {
        self.queue_host(ACK);
    }

    pub(crate) fn clear_host_queue(&mut self) {
        self.host_queue.clear();
    }

    /// Push `bytes` onto the record queue, logging and dropping
    /// whatever doesn't fit (`spec.md` §7 "Record queue full"). A
    /// landed `0xF7` (EOX) while a SysEx is still in progress finishes
    /// it right there, same as `MPU401_RecQueueBuffer`. Returns how
    /// many bytes were actually accepted.
    pub(crate) fn record_queue_push(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &b in bytes {
            match self.record_queue.push(b) {
                PushOutcome::Inserted { .. } => {
                    accepted += 1;
                    if !self.state.sysex_in_finished && b == EOX {
                        self.state.sysex_in_finished = true;
                        break;
                    }
                }
                PushOutcome::Dropped => {
                    log::warn!("MPU-401 record queue overflow, dropping byte {b:#04x}");
                    break;
                }
            }
        }
        accepted
    }

    /// `MPU401_StartClock`: arm the periodic event timer if it is not
    /// already running.
    pub(crate) fn start_clock(&mut self) {
        if !self.clock.active {
            self.clock.active = true;
            self.scheduler
                .arm(TimerKind::Event, self.clock.event_period_usec());
        }
    }

    /// `MPU401_StopClock`: disable the periodic event timer once
    /// nothing needs it any more.
    pub(crate) fn stop_clock(&mut self) {
        if self.clock.active && !self.state.needs_periodic_timer() {
            self.clock.active = false;
            self.scheduler.disable(TimerKind::Event);
        }
    }

    fn on_reset_done(&mut self) {
        self.state.reset = false;
        if self.state.cmd_pending != 0 {
            let val = (self.state.cmd_pending - 1) as u8;
            self.state.cmd_pending = 0;
            self.write_command(val);
        }
    }

    /// Full device reset (`MPU401_Reset`): drains every submachine
    /// back to its power-on defaults and returns to intelligent mode.
    fn reset(&mut self) {
        self.sink.reset();
        self.sink.clear_buffer();
        for channel in 0..16u8 {
            self.sink.raw_byte(0xb0 | channel);
            self.sink.raw_byte(0x7b);
            self.sink.raw_byte(0);
        }
        self.irq.deassert();

        self.mode = Mode::Intelligent;
        self.clock.active = false;
        self.scheduler.disable(TimerKind::Event);
        self.scheduler.disable(TimerKind::Eoi);

        self.state.reset_to_defaults();
        self.filter.reset();
        self.clock.reset();
        self.reference.reset();
        for t in &mut self.tracks {
            t.reset();
        }
        self.condbuf.reset();
        self.host_queue.clear();
        self.record_queue.clear();
        self.state.sysex_in_finished = true;
        self.old_msg = 0;
        self.wsd_len = 0;
        self.wsd_pos = 0;
        self.wsm_len = 0;
        self.wsm_pos = 0;

        self.state.cmask = 0xff;
        self.state.amask = 0;
        self.state.tmask = 0;
        self.state.midi_mask = 0xffff;
        self.state.data_onoff = DataOnOff::Idle;

        for i in 0..4usize {
            self.reference.chanref[i].on = true;
            self.reference.chanref[i].chan = i as u8;
            self.reference.ch_toref[i] = i;
        }
        for i in 0..16usize {
            self.reference.inputref[i].on = true;
            self.reference.inputref[i].chan = i as u8;
            self.reference.inputref[i].key.clear_all();
            if i > 3 {
                self.reference.ch_toref[i] = ChannelRef::DUMMY_SLOT;
            }
        }
    }
}
