// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod common;
pub mod config;
pub mod counters;
pub mod error;
pub mod markers;
pub mod metrics;
pub mod report;

pub use config::DramConfig;
pub use counters::imc::{CounterBackend, CounterHandle, DramCounter, KernelBackend};
pub use error::{DramflowError, Result};
pub use metrics::imc::DramTraffic;
pub use report::{read_record, write_record, DramReport};
