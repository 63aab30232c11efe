//! Barrier-synchronized execution of one pipeline phase.
//!
//! A phase is a list of independent work units (one per shard, or one per
//! shard and database for the search). All units are started on a pool sized to
//! the unit count (optionally capped) and the phase returns only after every
//! unit has finished. Each unit yields a [`WorkerReport`]; failures never abort
//! the phase, they are logged and handed back to the caller.

use crate::core::hits::Database;
use crate::utils::parallel::phase_pool;
use crate::utils::progress::phase_bar;
use crate::AnnoshardError;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often a running child is polled when a timeout is set
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trailing stderr lines kept for failure reports
const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    GeneCalling,
    ProfileSearch,
    HitParsing,
    Annotation,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::GeneCalling => "gene calling",
            Phase::ProfileSearch => "profile search",
            Phase::HitParsing => "hit parsing",
            Phase::Annotation => "annotation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub shard: String,
    pub database: Option<Database>,
}

impl WorkUnit {
    pub fn shard(shard: &str) -> Self {
        Self {
            shard: shard.to_string(),
            database: None,
        }
    }

    pub fn search(shard: &str, database: Database) -> Self {
        Self {
            shard: shard.to_string(),
            database: Some(database),
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.database {
            Some(database) => write!(f, "{} {}", self.shard, database),
            None => f.write_str(&self.shard),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Succeeded,
    /// Non-zero exit (code is `None` when killed by a signal) or an in-process error
    Failed { code: Option<i32>, detail: String },
    TimedOut,
    SpawnFailed(String),
}

impl WorkerStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerStatus::Succeeded)
    }

    pub fn from_result<T>(result: Result<T, AnnoshardError>) -> Self {
        match result {
            Ok(_) => WorkerStatus::Succeeded,
            Err(e) => WorkerStatus::Failed {
                code: None,
                detail: e.to_string(),
            },
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Succeeded => f.write_str("ok"),
            WorkerStatus::Failed { code, detail } => {
                match code {
                    Some(code) => write!(f, "exited with code {}", code)?,
                    None => f.write_str("failed")?,
                }
                if !detail.is_empty() {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            WorkerStatus::TimedOut => f.write_str("timed out and was killed"),
            WorkerStatus::SpawnFailed(reason) => write!(f, "could not be started: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub phase: Phase,
    pub unit: WorkUnit,
    pub status: WorkerStatus,
    pub elapsed: Duration,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.phase, self.unit, self.status)
    }
}

#[derive(Debug, Clone)]
pub struct PhaseSummary {
    pub phase: Phase,
    /// Reports in unit order
    pub reports: Vec<WorkerReport>,
    pub elapsed: Duration,
}

impl PhaseSummary {
    pub fn failures(&self) -> impl Iterator<Item = &WorkerReport> {
        self.reports.iter().filter(|r| !r.status.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.status.is_success()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseRunner {
    max_workers: Option<usize>,
    timeout: Option<Duration>,
    show_progress: bool,
}

impl PhaseRunner {
    pub fn new(max_workers: Option<usize>, timeout: Option<Duration>) -> Self {
        Self {
            max_workers,
            timeout,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run every unit and wait for all of them
    pub fn run<F>(&self, phase: Phase, units: Vec<WorkUnit>, work: F) -> Result<PhaseSummary, AnnoshardError>
    where
        F: Fn(&WorkUnit) -> WorkerStatus + Sync,
    {
        let started = Instant::now();
        if units.is_empty() {
            return Ok(PhaseSummary {
                phase,
                reports: Vec::new(),
                elapsed: started.elapsed(),
            });
        }

        let pool = phase_pool(units.len(), self.max_workers)?;
        let bar = phase_bar(units.len(), phase.label(), self.show_progress);
        debug!("{}: {} units on {} threads", phase, units.len(), pool.current_num_threads());

        let reports: Vec<WorkerReport> = pool.install(|| {
            units
                .into_par_iter()
                .map(|unit| {
                    let unit_started = Instant::now();
                    let status = work(&unit);
                    bar.inc(1);
                    WorkerReport {
                        phase,
                        unit,
                        status,
                        elapsed: unit_started.elapsed(),
                    }
                })
                .collect()
        });
        bar.finish_and_clear();

        let summary = PhaseSummary {
            phase,
            reports,
            elapsed: started.elapsed(),
        };
        for failure in summary.failures() {
            warn!("{}", failure);
        }
        info!(
            "{}: {}/{} units succeeded in {:.1}s",
            phase,
            summary.succeeded(),
            summary.reports.len(),
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}

/// Run an external command to completion, capturing the tail of its stderr.
///
/// With a timeout the child is killed once the limit passes and the unit is
/// reported as [`WorkerStatus::TimedOut`].
pub fn run_command(mut cmd: Command, timeout: Option<Duration>) -> WorkerStatus {
    cmd.stderr(Stdio::piped());
    let program = cmd.get_program().to_string_lossy().to_string();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return WorkerStatus::SpawnFailed(format!("{}: {}", program, e)),
    };

    let stderr_handle = child.stderr.take().map(drain_stderr);
    let outcome = wait_with_timeout(&mut child, timeout);
    let stderr_tail = stderr_handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    match outcome {
        Ok(Some(status)) if status.success() => WorkerStatus::Succeeded,
        Ok(Some(status)) => WorkerStatus::Failed {
            code: status.code(),
            detail: stderr_tail,
        },
        Ok(None) => WorkerStatus::TimedOut,
        Err(e) => WorkerStatus::Failed {
            code: None,
            detail: format!("{}: {}", program, e),
        },
    }
}

/// `Ok(None)` when the timeout expired and the child was killed
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // The child may exit between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a child's stderr to the end on its own thread, keeping the last lines
fn drain_stderr<R: Read + Send + 'static>(reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
        Vec::from(tail).join(" | ")
    })
}
