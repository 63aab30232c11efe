pub mod bio;
pub mod cli;
pub mod core;
pub mod tools;
pub mod utils;

pub use crate::core::pipeline::{Pipeline, PipelineOptions, RunSummary};

use thiserror::Error;

pub const PROGRAM: &str = concat!("annoshard v", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum AnnoshardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Missing prerequisite: {0}")]
    Precondition(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, AnnoshardError>;
