//! Device configuration: the one fallible boundary in this crate.
//!
//! `spec.md` §6 enumerates the recognised keys (`base`, `irq`,
//! `receive_input`, `intelligent_capable`) and states there is no
//! persisted state and no environment variables — so unlike the
//! teacher's `config.rs` (which
//! hand-parses JSON from disk to avoid pulling in `serde`), there is
//! nothing here to load or save. `Config` is just a validated,
//! in-memory value built once at construction time, modelled on the
//! `mpu401_standalone_config`/`mpu401_standalone_mca_config` selection
//! tables in `snd_mpu401.c`.

use std::fmt;

/// I/O base addresses selectable on the ISA variant (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseAddr {
    X0220,
    X0230,
    X0240,
    X0250,
    X0300,
    X0320,
    X0330,
    X0332,
    X0334,
    X0336,
    X0340,
    X0350,
}

impl BaseAddr {
    const ALL: [(u16, BaseAddr); 12] = [
        (0x220, BaseAddr::X0220),
        (0x230, BaseAddr::X0230),
        (0x240, BaseAddr::X0240),
        (0x250, BaseAddr::X0250),
        (0x300, BaseAddr::X0300),
        (0x320, BaseAddr::X0320),
        (0x330, BaseAddr::X0330),
        (0x332, BaseAddr::X0332),
        (0x334, BaseAddr::X0334),
        (0x336, BaseAddr::X0336),
        (0x340, BaseAddr::X0340),
        (0x350, BaseAddr::X0350),
    ];

    /// Resolve a raw port number to a `BaseAddr`, rejecting anything
    /// not in the selectable set.
    pub fn from_port(port: u16) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, b)| *b)
            .ok_or(ConfigError::InvalidBase(port))
    }

    /// The raw port number this variant represents.
    pub fn port(self) -> u16 {
        Self::ALL.iter().find(|(_, b)| *b == self).unwrap().0
    }
}

impl Default for BaseAddr {
    fn default() -> Self {
        BaseAddr::X0330
    }
}

/// The bus the device is attached to — governs the selectable IRQ set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Isa,
    Mca,
}

/// Host IRQ line. ISA selects from `{2, 3, 4, 5, 6, 7}` with IRQ 2
/// remapped to the cascaded IRQ 9 (the classic PC/AT quirk); MCA
/// selects from `{3, 4, 5, 6, 7, 9}` with default 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Irq(u8);

impl Irq {
    /// Validate and build an `Irq` for the given bus, applying the
    /// ISA 2->9 remap.
    pub fn new(raw: u8, bus: Bus) -> Result<Self, ConfigError> {
        let allowed: &[u8] = match bus {
            Bus::Isa => &[2, 3, 4, 5, 6, 7],
            Bus::Mca => &[3, 4, 5, 6, 7, 9],
        };
        if !allowed.contains(&raw) {
            return Err(ConfigError::InvalidIrq(raw));
        }
        let resolved = if bus == Bus::Isa && raw == 2 { 9 } else { raw };
        Ok(Irq(resolved))
    }

    /// The line number the host should actually wire up (post-remap).
    pub fn line(self) -> u8 {
        self.0
    }
}

impl Default for Irq {
    /// Default IRQ 9 — the MCA variant's stock value (`spec.md` §6);
    /// also what ISA's "IRQ 2" selection resolves to.
    fn default() -> Self {
        Irq(9)
    }
}

/// Construction-time configuration for a [`crate::Device`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub base: BaseAddr,
    pub irq: Irq,
    /// Whether the device should accept inbound MIDI at all
    /// (`MPU401_InputMsg`/`MPU401_InputSysex` wired up).
    pub receive_input: bool,
    /// Full intelligent-mode hardware capability vs. the reduced,
    /// UART-only capability of the Sound Blaster 16/AWE32-style MPU-401
    /// clones (`spec.md` §3; `mpu->intelligent` in `snd_mpu401.c`,
    /// fixed for the device's lifetime and distinct from the
    /// runtime-toggleable [`crate::Mode`]). `false` means the device
    /// refuses every command except `0xFF` (reset) and `0x3F` (enter
    /// UART).
    pub intelligent_capable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base: BaseAddr::default(),
            irq: Irq::default(),
            receive_input: true,
            intelligent_capable: true,
        }
    }
}

impl Config {
    /// Build a validated ISA configuration from raw values.
    pub fn isa(base_port: u16, irq: u8, receive_input: bool) -> Result<Self, ConfigError> {
        Ok(Config {
            base: BaseAddr::from_port(base_port)?,
            irq: Irq::new(irq, Bus::Isa)?,
            receive_input,
            intelligent_capable: true,
        })
    }

    /// Build a validated MCA configuration (base address is derived
    /// from POS registers by the host's bus plumbing, out of scope
    /// here — only the IRQ is validated).
    pub fn mca(irq: u8, receive_input: bool) -> Result<Self, ConfigError> {
        Ok(Config {
            base: BaseAddr::default(),
            irq: Irq::new(irq, Bus::Mca)?,
            receive_input,
            intelligent_capable: true,
        })
    }

    /// Mark this configuration as the reduced, UART-only capability
    /// clones expose (`spec.md` §3). `isa`/`mca` build full-capability
    /// devices by default; chain this to downgrade one.
    pub fn uart_only(mut self) -> Self {
        self.intelligent_capable = false;
        self
    }
}

/// The one error type this crate produces, all at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBase(u16),
    InvalidIrq(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBase(port) => {
                write!(f, "0x{port:03x} is not a selectable MPU-401 base address")
            }
            ConfigError::InvalidIrq(irq) => write!(f, "IRQ {irq} is not selectable on this bus"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isa_remaps_irq_2_to_9() {
        let cfg = Config::isa(0x330, 2, true).unwrap();
        assert_eq!(cfg.irq.line(), 9);
    }

    #[test]
    fn isa_rejects_mca_only_irq() {
        assert!(Irq::new(9, Bus::Isa).is_err());
    }

    #[test]
    fn mca_default_irq_is_9() {
        let cfg = Config::mca(9, true).unwrap();
        assert_eq!(cfg.irq.line(), 9);
    }

    #[test]
    fn rejects_unlisted_base() {
        assert!(matches!(
            BaseAddr::from_port(0x3f8),
            Err(ConfigError::InvalidBase(0x3f8))
        ));
    }

    #[test]
    fn base_port_roundtrips() {
        for port in [0x220, 0x300, 0x330, 0x350] {
            let b = BaseAddr::from_port(port).unwrap();
            assert_eq!(b.port(), port);
        }
    }

    #[test]
    fn default_and_isa_mca_are_fully_intelligent_capable() {
        assert!(Config::default().intelligent_capable);
        assert!(Config::isa(0x330, 2, true).unwrap().intelligent_capable);
        assert!(Config::mca(9, true).unwrap().intelligent_capable);
    }

    #[test]
    fn uart_only_downgrades_capability() {
        let cfg = Config::isa(0x330, 2, true).unwrap().uart_only();
        assert!(!cfg.intelligent_capable);
    }
}
