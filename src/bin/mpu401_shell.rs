// Minimal interactive shell over an in-process MPU-401 core.
// Reads whitespace-separated hex byte pairs from stdin, each pair
// `<port> <value>` where port 0 is the data port and port 1 the
// status/command port; writes go to the device, reads print the
// byte that came back. Outbound MIDI and IRQ activity are logged.
//
// Not a real host bus adapter — ports are those relative offsets,
// not real I/O addresses. For that, wire `mpu401_core::Device` into
// an actual `MidiSink`/`IrqLine`/`Scheduler` triple instead.

use std::io::{self, BufRead, Write};

use mpu401_core::{Config, Device, IrqLine, MidiSink, Scheduler, TimerKind};

struct StdoutSink;

impl MidiSink for StdoutSink {
    fn raw_byte(&mut self, byte: u8) {
        println!("out: {byte:#04x}");
    }

    fn realtime_byte(&mut self, byte: u8) {
        println!("out(rt): {byte:#04x}");
    }

    fn reset(&mut self) {
        log::info!("sink reset");
    }

    fn clear_buffer(&mut self) {
        log::info!("sink buffer cleared");
    }
}

struct LoggingIrq;

impl IrqLine for LoggingIrq {
    fn assert(&mut self) {
        log::info!("IRQ asserted");
    }

    fn deassert(&mut self) {
        log::info!("IRQ deasserted");
    }
}

/// Just logs what the device asks for; this shell drives `on_timer`
/// by hand via the `t <event|eoi|reset>` command instead of modelling
/// real elapsed time.
struct LoggingScheduler;

impl Scheduler for LoggingScheduler {
    fn arm(&mut self, timer: TimerKind, micros: u64) {
        log::debug!("timer {timer:?} armed for {micros}us");
    }

    fn advance(&mut self, timer: TimerKind, micros: u64) {
        log::debug!("timer {timer:?} advanced by {micros}us");
    }

    fn disable(&mut self, timer: TimerKind) {
        log::debug!("timer {timer:?} disabled");
    }
}

fn main() {
    env_logger::init();

    println!("mpu401-shell: `<port> <hex-byte>` writes, `r <port>` reads, `t <event|eoi|reset>` fires a timer.");

    let mut dev = Device::new(
        Config::default(),
        Box::new(StdoutSink),
        Box::new(LoggingIrq),
        Box::new(LoggingScheduler),
    );

    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("r") => {
                let Some(port) = tokens.next().and_then(|p| p.parse::<u16>().ok()) else {
                    eprintln!("usage: r <port>");
                    continue;
                };
                println!("in: {:#04x}", dev.read(port));
            }
            Some("t") => {
                let timer = match tokens.next() {
                    Some("event") => TimerKind::Event,
                    Some("eoi") => TimerKind::Eoi,
                    Some("reset") => TimerKind::ResetDone,
                    _ => {
                        eprintln!("usage: t <event|eoi|reset>");
                        continue;
                    }
                };
                dev.on_timer(timer);
            }
            Some(port) => {
                let Ok(port) = port.parse::<u16>() else {
                    eprintln!("unrecognised line, expected `<port> <hex-byte>` or `r <port>`");
                    continue;
                };
                let Some(val) = tokens
                    .next()
                    .and_then(|v| u8::from_str_radix(v.trim_start_matches("0x"), 16).ok())
                else {
                    eprintln!("usage: <port> <hex-byte>");
                    continue;
                };
                dev.write(port, val);
            }
            None => {}
        }

        // This stand-in scheduler doesn't model real elapsed time, so
        // just dispatch whatever got armed/advanced during the write.
        // A real host would instead wait for its own timer to fire.
        print!("> ");
        let _ = io::stdout().flush();
    }
}
