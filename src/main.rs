use annoshard::cli::{formatter, Cli, Commands};
use annoshard::AnnoshardError;
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    formatter::init();

    // ANNOSHARD_LOG wins; otherwise -v / -vv raise the default level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("ANNOSHARD_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        formatter::print_error(&format!("{:#}", e));

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<AnnoshardError>() {
            Some(AnnoshardError::Config(_)) => 2,
            Some(AnnoshardError::Io(_)) | Some(AnnoshardError::Csv(_)) => 3,
            Some(AnnoshardError::Format(_)) | Some(AnnoshardError::Parse(_)) => 4,
            Some(AnnoshardError::Precondition(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Annotate(args) => annoshard::cli::commands::annotate::run(args),
        Commands::Check(args) => annoshard::cli::commands::check::run(args),
    }
}
