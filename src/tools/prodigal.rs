use crate::tools::traits::ExternalTool;
use std::path::Path;
use std::process::{Command, Stdio};

/// Metagenomic-mode gene caller
pub struct GeneCaller {
    binary: String,
}

/// Output files of one gene-calling run
#[derive(Debug, Clone, Copy)]
pub struct GeneCallOutputs<'a> {
    pub proteins: &'a Path,
    pub genes: &'a Path,
    pub coordinates: &'a Path,
}

impl GeneCaller {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// `-m -p meta -f gff -q -i <input> -a <proteins> -d <genes> -o <coordinates>`
    pub fn command(&self, input: &Path, outputs: GeneCallOutputs<'_>) -> Command {
        let mut cmd = self.base_command();
        cmd.arg("-m")
            .args(["-p", "meta"])
            .args(["-f", "gff"])
            .arg("-q")
            .arg("-i")
            .arg(input)
            .arg("-a")
            .arg(outputs.proteins)
            .arg("-d")
            .arg(outputs.genes)
            .arg("-o")
            .arg(outputs.coordinates)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        cmd
    }
}

impl ExternalTool for GeneCaller {
    fn name(&self) -> &str {
        "gene caller"
    }

    fn binary(&self) -> &str {
        &self.binary
    }
}
