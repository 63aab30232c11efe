use crate::tools::traits::ExternalTool;
use crate::utils::tsv::format_float;
use std::path::Path;
use std::process::{Command, Stdio};

/// Profile-HMM search against one database, single-threaded per unit
pub struct ProfileSearch {
    binary: String,
    score_threshold: f64,
}

impl ProfileSearch {
    pub fn new(binary: impl Into<String>, score_threshold: f64) -> Self {
        Self {
            binary: binary.into(),
            score_threshold,
        }
    }

    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    /// `--tblout <tblout> -T <score> --cpu 1 --noali <profile> <proteins>`; stdout is discarded
    pub fn command(&self, profile: &Path, proteins: &Path, tblout: &Path) -> Command {
        let mut cmd = self.base_command();
        cmd.arg("--tblout")
            .arg(tblout)
            .arg("-T")
            .arg(format_float(self.score_threshold))
            .args(["--cpu", "1"])
            .arg("--noali")
            .arg(profile)
            .arg(proteins)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        cmd
    }
}

impl ExternalTool for ProfileSearch {
    fn name(&self) -> &str {
        "profile search"
    }

    fn binary(&self) -> &str {
        &self.binary
    }
}
