//! Intel Skylake-SP (Skylake Server) event definitions
//!
//! ## Uncore Units
//!
//! - **IMC** (Integrated Memory Controller) - DDR4 memory controller
//!
//! ## References
//!
//! - Intel® Xeon® Processor Scalable Family Uncore Performance Monitoring Reference Manual

pub mod imc;
