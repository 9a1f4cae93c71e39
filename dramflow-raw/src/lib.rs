//! # dramflow-raw
//!
//! Event encodings and `perf_event_open` primitives for Intel uncore
//! integrated memory-controller (iMC) performance counters.
//!
//! This crate knows nothing about discovery or measurement windows. It provides
//! the packed event-configuration layout the kernel expects for iMC events, the
//! CAS_COUNT encodings used when sysfs does not describe them, and thin
//! wrappers over the perf syscall and its ioctls.
//!
//! ## Features
//!
//! - `skylake` (default) - Skylake-SP / Cascade Lake-SP CAS_COUNT encodings
//!
//! ## Usage
//!
//! ```ignore
//! use dramflow_raw::current_arch::imc;
//! use dramflow_raw::{perf, EventLayout};
//!
//! let config = imc::ImcEventConfig::cas_count_read().to_config();
//! let fd = perf::open_counter(pmu_type, config, 0)?;
//! perf::reset(fd.as_fd())?;
//! perf::enable(fd.as_fd())?;
//! ```

pub mod arch;
pub mod perf;
pub mod register;

pub use perf::{PerfError, Result};
pub use register::EventLayout;

#[cfg(feature = "skylake")]
pub use arch::skylake as current_arch;
