use crate::bio::SequenceType;
use crate::cli::commands::load_or_default;
use crate::cli::formatter::{info_box, print_check, print_success};
use crate::core::config::{save_config, Config};
use crate::core::paths::{AUX_DIR_ENV, DATABASE_DIR_ENV};
use crate::core::preflight::{run_preflight, PreflightRequest};
use crate::AnnoshardError;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input format to check tools for (nucleotide input also needs the gene caller)
    #[arg(short = 'f', long, value_enum, default_value_t = SequenceType::Nucleotide)]
    pub format: SequenceType,

    /// Folder holding the pressed KEGG, Pfam and VOG profile databases
    #[arg(short = 'd', long, value_name = "DIR", env = DATABASE_DIR_ENV)]
    pub databases: Option<PathBuf>,

    /// Folder holding the reference tables
    #[arg(short = 'm', long, value_name = "DIR", env = AUX_DIR_ENV)]
    pub aux: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.write_config {
        save_config(path, &Config::default())?;
        print_success(&format!("Default configuration written to {}", path.display()));
        return Ok(());
    }

    let config = load_or_default(args.config.as_deref())?;
    let report = run_preflight(
        &config,
        &PreflightRequest {
            sequence_type: args.format,
            database_dir: args.databases.as_deref(),
            aux_dir: args.aux.as_deref(),
            output_dir: None,
            workers: 1,
        },
    );

    info_box(
        "Checking annoshard prerequisites",
        &[
            format!("format: {}", args.format),
            format!("gene caller: {}", config.tools.gene_caller),
            format!("profile search: {}", config.tools.profile_search),
        ],
    );
    println!();
    for check in &report.checks {
        print_check(&check.item, check.problem.as_deref());
    }

    let failed = report.problems().count();
    if failed > 0 {
        return Err(AnnoshardError::Precondition(format!("{} check(s) failed", failed)).into());
    }
    print_success("All checks passed");
    Ok(())
}
