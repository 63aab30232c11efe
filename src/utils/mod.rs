pub mod parallel;
pub mod progress;
pub mod tsv;
