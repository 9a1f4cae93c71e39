//! Architecture-specific event definitions
//!
//! The kernel usually describes iMC events through sysfs, so these encodings
//! only matter when that description is missing or unreadable.
//!
//! ## Supported Architectures
//!
//! - **Skylake-SP** (`skylake` feature) - Intel Xeon Scalable (Skylake / Cascade Lake Server)

#[cfg(feature = "skylake")]
pub mod skylake;
