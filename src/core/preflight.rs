//! Precondition checks run before anything is written.
//!
//! Every check runs even after an earlier one failed, so a single run reports
//! all missing folders, databases, reference tables and tools together.

use crate::bio::sequence::SequenceType;
use crate::core::config::Config;
use crate::core::hits::Database;
use crate::core::paths::{resolve_dir, AUX_DIR_ENV, DATABASE_DIR_ENV};
use crate::tools::{ExternalTool, GeneCaller, ProfileSearch};
use crate::AnnoshardError;
use std::path::{Path, PathBuf};

/// Suffix of the pressed profile file that marks a database as installed
pub const PRESSED_PROFILE_SUFFIX: &str = ".h3f";

/// Inputs to the precondition checks that come from the command line
#[derive(Debug, Clone, Copy)]
pub struct PreflightRequest<'a> {
    pub sequence_type: SequenceType,
    pub database_dir: Option<&'a Path>,
    pub aux_dir: Option<&'a Path>,
    /// Output folder that is about to be created, if any
    pub output_dir: Option<&'a Path>,
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub item: String,
    /// `None` when the check passed
    pub problem: Option<String>,
}

impl CheckResult {
    fn pass(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            problem: None,
        }
    }

    fn fail(item: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            problem: Some(problem.into()),
        }
    }

    fn from_result<T>(item: impl Into<String>, result: Result<T, AnnoshardError>) -> Self {
        match result {
            Ok(_) => Self::pass(item),
            Err(AnnoshardError::Precondition(msg)) => Self::fail(item, msg),
            Err(e) => Self::fail(item, e.to_string()),
        }
    }

    pub fn passed(&self) -> bool {
        self.problem.is_none()
    }
}

/// Folders every later phase reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirs {
    pub database_dir: PathBuf,
    pub aux_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
    database_dir: Option<PathBuf>,
    aux_dir: Option<PathBuf>,
}

impl PreflightReport {
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }

    pub fn problems(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// The resolved folders, or one precondition error listing every problem
    pub fn into_result(self) -> Result<ResolvedDirs, AnnoshardError> {
        let problems: Vec<String> = self
            .problems()
            .map(|c| format!("{}: {}", c.item, c.problem.as_deref().unwrap_or_default()))
            .collect();
        match (self.database_dir, self.aux_dir) {
            (Some(database_dir), Some(aux_dir)) if problems.is_empty() => Ok(ResolvedDirs {
                database_dir,
                aux_dir,
            }),
            _ => Err(AnnoshardError::Precondition(format!(
                "{} problem(s) found:\n  {}",
                problems.len(),
                problems.join("\n  ")
            ))),
        }
    }
}

pub fn run_preflight(config: &Config, request: &PreflightRequest<'_>) -> PreflightReport {
    let mut checks = Vec::new();

    checks.push(if request.workers >= 1 {
        CheckResult::pass("workers")
    } else {
        CheckResult::fail("workers", "worker count must be at least 1")
    });

    if let Some(output) = request.output_dir {
        checks.push(if output.exists() {
            CheckResult::fail(
                "output folder",
                format!(
                    "{} already exists; remove it or choose another output folder",
                    output.display()
                ),
            )
        } else {
            CheckResult::pass("output folder")
        });
    }

    let database_dir = resolve_dir(request.database_dir, DATABASE_DIR_ENV, "databases");
    let database_dir = match database_dir {
        Ok(dir) => {
            checks.push(CheckResult::pass("database folder"));
            for database in Database::ALL {
                let profile = &config.databases.get(database).profile;
                let pressed = dir.join(format!("{}{}", profile, PRESSED_PROFILE_SUFFIX));
                let item = format!("{} profiles", database);
                checks.push(if pressed.is_file() {
                    CheckResult::pass(item)
                } else {
                    CheckResult::fail(
                        item,
                        format!("{} not found; is the database installed and pressed?", pressed.display()),
                    )
                });
            }
            Some(dir)
        }
        Err(e) => {
            checks.push(CheckResult::from_result("database folder", Err::<(), _>(e)));
            None
        }
    };

    let aux_dir = match resolve_dir(request.aux_dir, AUX_DIR_ENV, "reference files") {
        Ok(dir) => {
            checks.push(CheckResult::pass("reference folder"));
            let files = &config.reference;
            for name in [&files.names, &files.special_interest, &files.categories, &files.pathways] {
                let path = dir.join(name);
                let item = format!("reference table {}", name);
                checks.push(if path.is_file() {
                    CheckResult::pass(item)
                } else {
                    CheckResult::fail(item, format!("{} not found", path.display()))
                });
            }
            Some(dir)
        }
        Err(e) => {
            checks.push(CheckResult::from_result("reference folder", Err::<(), _>(e)));
            None
        }
    };

    let search = ProfileSearch::new(&config.tools.profile_search, config.pipeline.score_threshold);
    checks.push(CheckResult::from_result(search.name(), search.verify_installation()));
    if request.sequence_type == SequenceType::Nucleotide {
        let caller = GeneCaller::new(&config.tools.gene_caller);
        checks.push(CheckResult::from_result(caller.name(), caller.verify_installation()));
    }

    PreflightReport {
        checks,
        database_dir,
        aux_dir,
    }
}
