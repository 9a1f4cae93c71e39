//! IMC (Integrated Memory Controller) event definitions for Skylake-SP
//!
//! The iMC PMU counts column-address-strobe (CAS) commands issued to DRAM.
//! Each CAS command moves one 64-byte cache line, which makes CAS_COUNT a
//! direct proxy for DRAM read/write traffic.
//!
//! ## References
//!
//! - Intel® Xeon® Processor Scalable Family Uncore Performance Monitoring Reference Manual
//! - Section: Memory Controller Performance Monitoring

use crate::register::EventLayout;

/// Cache line size for byte calculations (64 bytes)
pub const CACHE_LINE_SIZE: u64 = 64;

/// Name prefix of iMC PMU devices registered under `event_source`
pub const IMC_DEVICE_PREFIX: &str = "uncore_imc";

/// Packed CAS_COUNT.RD encoding (event 0x04, umask 0x03)
pub const CAS_COUNT_READ: u64 = 0x0304;

/// Packed CAS_COUNT.WR encoding (event 0x04, umask 0x0C)
pub const CAS_COUNT_WRITE: u64 = 0x0c04;

/// sysfs event names exposed by the uncore_imc driver
pub mod sysfs {
    pub const CAS_COUNT_READ: &str = "cas_count_read";
    pub const CAS_COUNT_WRITE: &str = "cas_count_write";
}

/// IMC performance event codes
pub mod events {
    /// CAS Count event select
    pub const CAS_COUNT: u8 = 0x04;

    /// Umask for read CAS operations
    pub const CAS_COUNT_RD_UMASK: u8 = 0x03;

    /// Umask for write CAS operations
    pub const CAS_COUNT_WR_UMASK: u8 = 0x0C;
}

/// IMC event configuration word
///
/// ## Config Format
///
/// | Bits   | Field       | Description                          |
/// |--------|-------------|--------------------------------------|
/// | 0-7    | event       | Event code to count                  |
/// | 8-15   | umask       | Event sub-select (umask)             |
/// | 18     | edge        | Count rising edges vs level          |
/// | 23     | inv         | Invert threshold comparison          |
/// | 24-31  | cmask       | Threshold for filtering              |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImcEventConfig {
    /// Event select code (bits 0-7)
    pub event: u8,

    /// Unit mask (bits 8-15)
    pub umask: u8,

    /// Edge detect (bit 18)
    pub edge: bool,

    /// Invert threshold (bit 23)
    pub invert: bool,

    /// Counter mask / threshold (bits 24-31)
    pub threshold: u8,
}

/// Pack raw field values into a config word
///
/// Values are shifted into place without masking, so a field wider than its
/// slot spills into the neighbouring bits exactly as the kernel would see it.
pub const fn pack_fields(event: u64, umask: u64, edge: u64, inv: u64, cmask: u64) -> u64 {
    event | (umask << 8) | (edge << 18) | (inv << 23) | (cmask << 24)
}

impl ImcEventConfig {
    pub const fn cas_count_read() -> Self {
        Self {
            event: events::CAS_COUNT,
            umask: events::CAS_COUNT_RD_UMASK,
            edge: false,
            invert: false,
            threshold: 0,
        }
    }

    pub const fn cas_count_write() -> Self {
        Self {
            event: events::CAS_COUNT,
            umask: events::CAS_COUNT_WR_UMASK,
            edge: false,
            invert: false,
            threshold: 0,
        }
    }
}

impl EventLayout for ImcEventConfig {
    fn to_config(&self) -> u64 {
        pack_fields(
            self.event as u64,
            self.umask as u64,
            self.edge as u64,
            self.invert as u64,
            self.threshold as u64,
        )
    }

    fn from_config(value: u64) -> Self {
        Self {
            event: (value & 0xFF) as u8,
            umask: ((value >> 8) & 0xFF) as u8,
            edge: (value & (1 << 18)) != 0,
            invert: (value & (1 << 23)) != 0,
            threshold: ((value >> 24) & 0xFF) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.invert && self.threshold == 0 {
            return Err("Invert requires a non-zero threshold");
        }
        Ok(())
    }
}
