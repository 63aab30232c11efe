pub mod hmmsearch;
pub mod prodigal;
pub mod runner;
pub mod traits;

pub use hmmsearch::ProfileSearch;
pub use prodigal::{GeneCallOutputs, GeneCaller};
pub use runner::{run_command, Phase, PhaseRunner, PhaseSummary, WorkUnit, WorkerReport, WorkerStatus};
pub use traits::ExternalTool;
