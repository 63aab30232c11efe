pub mod commands;
pub mod formatter;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "annoshard",
    version,
    about = "Sharded KEGG, Pfam and VOG annotation of viral scaffolds or proteins",
    long_about = "Annoshard splits a FASTA input into byte-balanced shards, calls genes \
                  (nucleotide input), searches every shard against the KEGG, Pfam and VOG \
                  profile databases in parallel, and merges the per-shard results into \
                  whole-input annotation tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate a nucleotide or protein FASTA file
    Annotate(commands::annotate::AnnotateArgs),

    /// Check databases, reference tables and external tools without running anything
    Check(commands::check::CheckArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_annotate_defaults() {
        let cli = Cli::try_parse_from(["annoshard", "annotate", "-i", "phages.fna"]).unwrap();
        let Commands::Annotate(args) = cli.command else {
            panic!("expected annotate");
        };
        assert_eq!(args.threads, 1);
        assert_eq!(args.format, crate::bio::SequenceType::Nucleotide);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_format_aliases() {
        let cli = Cli::try_parse_from(["annoshard", "-vv", "annotate", "-i", "p.faa", "-f", "prot", "-t", "4"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Annotate(args) = cli.command else {
            panic!("expected annotate");
        };
        assert_eq!(args.format, crate::bio::SequenceType::Protein);
        assert_eq!(args.threads, 4);
    }
}
