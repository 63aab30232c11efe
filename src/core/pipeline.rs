//! End-to-end orchestration.
//!
//! Phases run strictly one after another and each one is a barrier: every
//! unit of a phase has exited before the next phase creates its units.
//!
//! ```text
//! detect -> shard -> [gene calling] -> search (shard x db) -> parse -> annotate -> aggregate
//! ```
//!
//! Format and precondition problems abort before the output folder exists.
//! Worker failures are collected, logged, and written to the run log; the
//! affected shard simply contributes fewer rows.

use crate::bio::detect::detect_format;
use crate::bio::sequence::SequenceType;
use crate::core::aggregator::Aggregator;
use crate::core::config::Config;
use crate::core::hits::{parse_shard, Database};
use crate::core::joiner::annotate_shard;
use crate::core::paths::{default_output_dir, input_base_name, OutputLayout};
use crate::core::preflight::{run_preflight, PreflightRequest, ResolvedDirs};
use crate::core::reference::ReferenceTables;
use crate::core::sharder::Sharder;
use crate::tools::{
    run_command, GeneCallOutputs, GeneCaller, Phase, PhaseRunner, PhaseSummary, ProfileSearch,
    WorkUnit, WorkerReport, WorkerStatus,
};
use crate::{AnnoshardError, PROGRAM};
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub sequence_type: SequenceType,
    /// Defaults to `annoshard_results_<base>` in the working directory
    pub output_dir: Option<PathBuf>,
    /// Number of shards, and workers per phase
    pub workers: usize,
    pub database_dir: Option<PathBuf>,
    pub aux_dir: Option<PathBuf>,
    pub config: Config,
    pub show_progress: bool,
    /// Recorded verbatim in the run log
    pub command_line: String,
}

impl PipelineOptions {
    pub fn new<P: AsRef<Path>>(input: P, sequence_type: SequenceType) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            sequence_type,
            output_dir: None,
            workers: 1,
            database_dir: None,
            aux_dir: None,
            config: Config::default(),
            show_progress: false,
            command_line: String::new(),
        }
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&self.input))
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub shards: usize,
    /// Proteins in the best-annotation table
    pub proteins: usize,
    pub special_interest: usize,
    /// Every unit that did not succeed, across all phases
    pub failures: Vec<WorkerReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run(&self) -> Result<RunSummary, AnnoshardError> {
        let opts = &self.options;
        let config = &opts.config;
        let started_at = Local::now();
        let timer = Instant::now();

        config.validate()?;
        if !opts.input.is_file() {
            return Err(AnnoshardError::Precondition(format!(
                "input file {} not found",
                opts.input.display()
            )));
        }

        let output_dir = opts.resolved_output_dir();
        let dirs = run_preflight(
            config,
            &PreflightRequest {
                sequence_type: opts.sequence_type,
                database_dir: opts.database_dir.as_deref(),
                aux_dir: opts.aux_dir.as_deref(),
                output_dir: Some(&output_dir),
                workers: opts.workers,
            },
        )
        .into_result()?;

        detect_format(&opts.input, opts.sequence_type)?;
        let refs = ReferenceTables::load(&dirs.aux_dir, &config.reference)?;

        let layout = OutputLayout::new(&output_dir, &input_base_name(&opts.input));
        for dir in [
            layout.split_dir(),
            layout.raw_results_dir(),
            layout.parsed_results_dir(),
            layout.annotations_temp_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        info!(
            "Annotating {} ({}) into {}",
            opts.input.display(),
            opts.sequence_type,
            output_dir.display()
        );

        let shard_set = Sharder::new(layout.split_dir(), opts.workers)?.shard(&opts.input, opts.sequence_type)?;
        let shards: Vec<String> = shard_set.names().map(str::to_string).collect();

        let runner = PhaseRunner::new(
            config.pipeline.max_concurrent_workers,
            config.pipeline.worker_timeout(),
        )
        .with_progress(opts.show_progress);

        let mut phases = Vec::new();
        if opts.sequence_type == SequenceType::Nucleotide {
            phases.push(self.call_genes(&runner, &layout, &shards)?);
        }
        phases.push(self.search_profiles(&runner, &layout, &dirs, &shards)?);
        phases.push(self.parse_hits(&runner, &layout, &shards)?);
        phases.push(self.annotate(&runner, &layout, &shards, &refs)?);

        let aggregate = Aggregator::new(&layout, &shards, &refs).run(opts.sequence_type)?;

        let failures: Vec<WorkerReport> = phases
            .iter()
            .flat_map(|phase| phase.failures().cloned())
            .collect();

        let summary = RunSummary {
            output_dir,
            shards: shards.len(),
            proteins: aggregate.proteins,
            special_interest: aggregate.special_interest,
            failures,
            elapsed: timer.elapsed(),
        };
        write_run_log(&layout.run_log(), &opts.command_line, started_at, Local::now(), &summary)?;

        info!(
            "Finished in {:.2} minutes with {} worker failure(s)",
            summary.elapsed.as_secs_f64() / 60.0,
            summary.failures.len()
        );
        Ok(summary)
    }

    fn call_genes(
        &self,
        runner: &PhaseRunner,
        layout: &OutputLayout,
        shards: &[String],
    ) -> Result<PhaseSummary, AnnoshardError> {
        let caller = GeneCaller::new(&self.options.config.tools.gene_caller);
        let units = shards.iter().map(|s| WorkUnit::shard(s)).collect();
        runner.run(Phase::GeneCalling, units, |unit| {
            let shard = unit.shard.as_str();
            let proteins = layout.shard_proteins(shard);
            let genes = layout.shard_genes(shard);
            let coordinates = layout.shard_coordinates(shard);
            let cmd = caller.command(
                &layout.shard_input(shard, SequenceType::Nucleotide),
                GeneCallOutputs {
                    proteins: &proteins,
                    genes: &genes,
                    coordinates: &coordinates,
                },
            );
            run_command(cmd, runner.timeout())
        })
    }

    fn search_profiles(
        &self,
        runner: &PhaseRunner,
        layout: &OutputLayout,
        dirs: &ResolvedDirs,
        shards: &[String],
    ) -> Result<PhaseSummary, AnnoshardError> {
        let config = &self.options.config;
        let search = ProfileSearch::new(&config.tools.profile_search, config.pipeline.score_threshold);
        let units = shards
            .iter()
            .flat_map(|s| Database::ALL.map(|db| WorkUnit::search(s, db)))
            .collect();

        runner.run(Phase::ProfileSearch, units, |unit| {
            let Some(database) = unit.database else {
                return WorkerStatus::Failed {
                    code: None,
                    detail: "search unit without a database".to_string(),
                };
            };
            let proteins = layout.shard_proteins(&unit.shard);
            if !proteins.is_file() {
                return WorkerStatus::Failed {
                    code: None,
                    detail: format!("{} is missing", proteins.display()),
                };
            }
            let profile = dirs.database_dir.join(&config.databases.get(database).profile);
            let cmd = search.command(&profile, &proteins, &layout.tblout_path(&unit.shard, database));
            debug!("{}: {:?}", unit, cmd);
            run_command(cmd, runner.timeout())
        })
    }

    fn parse_hits(
        &self,
        runner: &PhaseRunner,
        layout: &OutputLayout,
        shards: &[String],
    ) -> Result<PhaseSummary, AnnoshardError> {
        let layouts = self.options.config.databases.layouts();
        let units = shards.iter().map(|s| WorkUnit::shard(s)).collect();
        runner.run(Phase::HitParsing, units, |unit| {
            WorkerStatus::from_result(parse_shard(layout, &unit.shard, &layouts))
        })
    }

    fn annotate(
        &self,
        runner: &PhaseRunner,
        layout: &OutputLayout,
        shards: &[String],
        refs: &ReferenceTables,
    ) -> Result<PhaseSummary, AnnoshardError> {
        let units = shards.iter().map(|s| WorkUnit::shard(s)).collect();
        runner.run(Phase::Annotation, units, |unit| {
            WorkerStatus::from_result(annotate_shard(layout, &unit.shard, refs))
        })
    }
}

/// Plain-text record of the run next to the reports
fn write_run_log(
    path: &Path,
    command_line: &str,
    started_at: DateTime<Local>,
    finished_at: DateTime<Local>,
    summary: &RunSummary,
) -> Result<(), AnnoshardError> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "Command:   {}", command_line)?;
    writeln!(file, "Date:      {} (M/D/Y)", started_at.format("%m/%d/%y"))?;
    writeln!(file, "Start:     {}", started_at.format("%H:%M"))?;
    writeln!(file, "End:       {}", finished_at.format("%H:%M"))?;
    writeln!(file, "Runtime:   {:.2} minutes", summary.elapsed.as_secs_f64() / 60.0)?;
    writeln!(file, "Program:   {}", PROGRAM)?;
    writeln!(file, "Shards:    {}", summary.shards)?;
    writeln!(file, "Failures:  {}", summary.failures.len())?;
    for failure in &summary.failures {
        writeln!(file, "  {}", failure)?;
    }
    Ok(())
}
