//! In-memory test doubles for the three external collaborator traits,
//! shared by unit tests across the crate. Modelled on the teacher's
//! own small fake-hardware stand-ins in its device tests.

use std::sync::{Arc, Mutex};

use crate::scheduler::TimerKind;
use crate::{IrqLine, MidiSink, Scheduler};

/// Records every byte handed to the sink, tagged by kind, in a shared
/// log a test can inspect after driving the device.
#[derive(Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<u8>>>,
    pub resets: u32,
    pub clears: u32,
}

impl RecordingSink {
    pub fn log(&self) -> Arc<Mutex<Vec<u8>>> {
        self.log.clone()
    }
}

impl MidiSink for RecordingSink {
    fn raw_byte(&mut self, byte: u8) {
        self.log.lock().unwrap().push(byte);
    }

    fn realtime_byte(&mut self, byte: u8) {
        self.log.lock().unwrap().push(byte);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn clear_buffer(&mut self) {
        self.clears += 1;
    }
}

/// An IRQ line that just counts assert/deassert calls.
#[derive(Default)]
pub struct NullIrq {
    pub asserted: bool,
    pub assert_count: u32,
}

impl IrqLine for NullIrq {
    fn assert(&mut self) {
        self.asserted = true;
        self.assert_count += 1;
    }

    fn deassert(&mut self) {
        self.asserted = false;
    }
}

/// A scheduler that records the last arm/advance per timer kind
/// without ever actually calling back; tests drive `Device::on_timer`
/// directly instead of waiting on real time.
#[derive(Default)]
pub struct NullScheduler {
    pub armed: Vec<(TimerKind, u64)>,
    pub disabled: Vec<TimerKind>,
}

impl Scheduler for NullScheduler {
    fn arm(&mut self, timer: TimerKind, micros: u64) {
        self.armed.push((timer, micros));
    }

    fn advance(&mut self, timer: TimerKind, micros: u64) {
        self.armed.push((timer, micros));
    }

    fn disable(&mut self, timer: TimerKind) {
        self.disabled.push(timer);
    }
}
