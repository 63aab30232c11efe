/// Trait definitions for the external tools driven by the pipeline
///
/// Each tool only knows how to build the command line for one unit of work;
/// spawning, waiting and failure reporting live in the phase runner.

use crate::AnnoshardError;
use std::path::PathBuf;
use std::process::Command;

/// Common interface for external command-line tools
pub trait ExternalTool: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Binary name on PATH or an explicit path
    fn binary(&self) -> &str;

    /// Verify that the tool can be found and return its resolved location
    fn verify_installation(&self) -> Result<PathBuf, AnnoshardError> {
        which::which(self.binary()).map_err(|_| {
            AnnoshardError::Precondition(format!(
                "{} ('{}') not found on PATH",
                self.name(),
                self.binary()
            ))
        })
    }

    /// Fresh command for this tool with no arguments yet
    fn base_command(&self) -> Command {
        Command::new(self.binary())
    }
}
