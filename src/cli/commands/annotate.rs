use crate::bio::SequenceType;
use crate::cli::commands::load_or_default;
use crate::cli::formatter::{format_number, print_stats_table, print_success, print_tip, print_warning};
use crate::core::paths::{AUX_DIR_ENV, DATABASE_DIR_ENV};
use crate::utils::parallel::resolve_workers;
use crate::{Pipeline, PipelineOptions, RunSummary};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Input FASTA file (scaffolds or gene-caller proteins)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    /// Input format
    #[arg(short = 'f', long, value_enum, default_value_t = SequenceType::Nucleotide)]
    pub format: SequenceType,

    /// Output folder (default: annoshard_results_<input name>); must not exist
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of shards and parallel workers (0 = all CPUs)
    #[arg(short = 't', long, default_value = "1")]
    pub threads: usize,

    /// Minimum bit score for profile hits (overrides the config file)
    #[arg(short = 's', long, value_name = "SCORE")]
    pub score: Option<f64>,

    /// Folder holding the pressed KEGG, Pfam and VOG profile databases
    #[arg(short = 'd', long, value_name = "DIR", env = DATABASE_DIR_ENV)]
    pub databases: Option<PathBuf>,

    /// Folder holding the reference tables (names, AMGs, categories, pathways)
    #[arg(short = 'm', long, value_name = "DIR", env = AUX_DIR_ENV)]
    pub aux: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Kill any single worker that runs longer than this
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

pub fn run(args: AnnotateArgs) -> anyhow::Result<()> {
    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(score) = args.score {
        config.pipeline.score_threshold = score;
    }
    if let Some(timeout) = args.timeout {
        config.pipeline.worker_timeout_secs = Some(timeout);
    }

    let mut options = PipelineOptions::new(&args.input, args.format);
    options.output_dir = args.output;
    options.workers = resolve_workers(args.threads);
    options.database_dir = args.databases;
    options.aux_dir = args.aux;
    options.config = config;
    options.show_progress = !args.no_progress;
    options.command_line = std::env::args().collect::<Vec<_>>().join(" ");

    let input = args.input.display().to_string();
    let summary = Pipeline::new(options)
        .run()
        .with_context(|| format!("annotation of {} did not complete", input))?;
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    print_stats_table(
        "Annotation summary",
        vec![
            ("Shards", summary.shards.to_string()),
            ("Proteins annotated", format_number(summary.proteins)),
            ("Special-interest hits", format_number(summary.special_interest)),
            ("Worker failures", summary.failures.len().to_string()),
            ("Runtime", format!("{:.2} minutes", summary.elapsed.as_secs_f64() / 60.0)),
        ],
    );

    for failure in &summary.failures {
        print_warning(&failure.to_string());
    }
    if !summary.is_clean() {
        print_tip("failed shards contribute no rows; rerun with a fresh output folder once the cause is fixed");
    }

    print_success(&format!("Results written to {}", summary.output_dir.display()));
}
