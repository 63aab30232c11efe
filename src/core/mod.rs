pub mod aggregator;
pub mod config;
pub mod hits;
pub mod joiner;
pub mod paths;
pub mod pipeline;
pub mod preflight;
pub mod reference;
pub mod sharder;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineOptions, RunSummary};
