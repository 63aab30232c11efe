pub mod detect;
pub mod fasta;
pub mod sequence;

pub use sequence::{Record, SequenceType};
