use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DramflowError {
    #[error("Perf operation failed: {0}")]
    PerfError(#[from] dramflow_raw::PerfError),

    #[error("Record operation failed: {0}")]
    RecordError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, DramflowError>;
