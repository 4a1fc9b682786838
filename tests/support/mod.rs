//! Shared test doubles for the black-box scenario tests in
//! `scenarios.rs`. Integration tests only see the crate's public
//! surface, so these are separate from `src/test_support.rs`'s
//! unit-test doubles.

use std::sync::{Arc, Mutex};

use mpu401_core::{IrqLine, MidiSink, Scheduler, TimerKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutByte {
    Raw(u8),
    Realtime(u8),
}

#[derive(Default)]
pub struct RecordingSink {
    pub out: Arc<Mutex<Vec<OutByte>>>,
    pub resets: u32,
}

impl RecordingSink {
    pub fn bytes(&self) -> Vec<u8> {
        self.out
            .lock()
            .unwrap()
            .iter()
            .map(|b| match *b {
                OutByte::Raw(v) => v,
                OutByte::Realtime(v) => v,
            })
            .collect()
    }
}

impl MidiSink for RecordingSink {
    fn raw_byte(&mut self, byte: u8) {
        self.out.lock().unwrap().push(OutByte::Raw(byte));
    }

    fn realtime_byte(&mut self, byte: u8) {
        self.out.lock().unwrap().push(OutByte::Realtime(byte));
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn clear_buffer(&mut self) {}
}

#[derive(Default)]
pub struct RecordingIrq {
    pub asserted: bool,
}

impl IrqLine for RecordingIrq {
    fn assert(&mut self) {
        self.asserted = true;
    }

    fn deassert(&mut self) {
        self.asserted = false;
    }
}

/// Records arm/advance requests without firing them; scenario tests
/// drive `Device::on_timer` directly instead of waiting on real time.
#[derive(Default)]
pub struct RecordingScheduler {
    pub armed: Vec<TimerKind>,
}

impl Scheduler for RecordingScheduler {
    fn arm(&mut self, timer: TimerKind, _micros: u64) {
        self.armed.push(timer);
    }

    fn advance(&mut self, timer: TimerKind, _micros: u64) {
        self.armed.push(timer);
    }

    fn disable(&mut self, timer: TimerKind) {
        self.armed.retain(|&t| t != timer);
    }
}
