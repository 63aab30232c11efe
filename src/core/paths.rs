use crate::bio::sequence::SequenceType;
use crate::core::hits::Database;
use crate::AnnoshardError;
use std::path::{Path, PathBuf};

/// Environment variable naming the profile database folder
pub const DATABASE_DIR_ENV: &str = "ANNOSHARD_DB";

/// Environment variable naming the reference table folder
pub const AUX_DIR_ENV: &str = "ANNOSHARD_AUX";

/// Resolve a folder from an explicit flag, falling back to an environment variable
pub fn resolve_dir(
    flag: Option<&Path>,
    env_var: &str,
    what: &str,
) -> Result<PathBuf, AnnoshardError> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    match std::env::var(env_var) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Err(AnnoshardError::Precondition(format!(
            "specify the {} folder or set {} (e.g. export {}='/path/to/{}/')",
            what,
            env_var,
            env_var,
            what.replace(' ', "_")
        ))),
    }
}

/// Input file name without its last extension
pub fn input_base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

/// Output folder used when none is given
pub fn default_output_dir(input: &Path) -> PathBuf {
    PathBuf::from(format!("annoshard_results_{}", input_base_name(input)))
}

/// Every path the pipeline reads or writes below the output folder.
///
/// Shard-scoped folders (`split_files`, `raw_search_results`,
/// `parsed_search_results`, `annotations_temp`) only live for the duration of a run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub base: String,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P, base: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base: base.to_string(),
        }
    }

    pub fn split_dir(&self) -> PathBuf {
        self.root.join("split_files")
    }

    pub fn raw_results_dir(&self) -> PathBuf {
        self.root.join("raw_search_results")
    }

    pub fn parsed_results_dir(&self) -> PathBuf {
        self.root.join("parsed_search_results")
    }

    pub fn annotations_temp_dir(&self) -> PathBuf {
        self.root.join("annotations_temp")
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.root.join("annotations")
    }

    pub fn gene_calls_dir(&self) -> PathBuf {
        self.root.join("gene_calls")
    }

    pub fn search_results_dir(&self) -> PathBuf {
        self.root.join("search_results")
    }

    /// Folders removed once aggregation has produced the final tables
    pub fn transient_dirs(&self) -> [PathBuf; 4] {
        [
            self.split_dir(),
            self.raw_results_dir(),
            self.parsed_results_dir(),
            self.annotations_temp_dir(),
        ]
    }

    /// Shard file written by the sharder
    pub fn shard_input(&self, shard: &str, sequence_type: SequenceType) -> PathBuf {
        self.split_dir()
            .join(format!("{}.{}", shard, sequence_type.shard_extension()))
    }

    /// Protein translations of a shard (gene-caller output, or the shard itself for protein input)
    pub fn shard_proteins(&self, shard: &str) -> PathBuf {
        self.split_dir().join(format!("{}.faa", shard))
    }

    pub fn shard_genes(&self, shard: &str) -> PathBuf {
        self.split_dir().join(format!("{}.ffn", shard))
    }

    pub fn shard_coordinates(&self, shard: &str) -> PathBuf {
        self.split_dir().join(format!("{}.gff", shard))
    }

    pub fn tblout_path(&self, shard: &str, database: Database) -> PathBuf {
        self.raw_results_dir()
            .join(format!("{}.{}.tblout", shard, database.label()))
    }

    pub fn raw_table_path(&self, shard: &str, database: Database) -> PathBuf {
        self.raw_results_dir()
            .join(format!("{}.{}.hmmtbl", shard, database.label()))
    }

    pub fn parsed_table_path(&self, shard: &str, database: Database) -> PathBuf {
        self.parsed_results_dir()
            .join(format!("{}.{}.tsv", shard, database.label()))
    }

    pub fn shard_full_path(&self, shard: &str) -> PathBuf {
        self.annotations_temp_dir().join(format!("{}.full.tsv", shard))
    }

    pub fn shard_best_path(&self, shard: &str) -> PathBuf {
        self.annotations_temp_dir().join(format!("{}.best.tsv", shard))
    }

    pub fn shard_special_path(&self, shard: &str) -> PathBuf {
        self.annotations_temp_dir().join(format!("{}.amgs.tsv", shard))
    }

    pub fn full_annotations(&self) -> PathBuf {
        self.annotations_dir()
            .join(format!("full_annotations_{}.tsv", self.base))
    }

    pub fn best_annotations(&self) -> PathBuf {
        self.annotations_dir()
            .join(format!("best_annotations_{}.tsv", self.base))
    }

    pub fn special_individuals(&self) -> PathBuf {
        self.annotations_dir()
            .join(format!("amg_individuals_{}.tsv", self.base))
    }

    pub fn special_counts(&self) -> PathBuf {
        self.annotations_dir()
            .join(format!("amg_counts_{}.tsv", self.base))
    }

    pub fn special_pathways(&self) -> PathBuf {
        self.annotations_dir()
            .join(format!("amg_pathways_{}.tsv", self.base))
    }

    /// Whole-input gene-caller output with the given extension (`faa`, `ffn`, `gff`)
    pub fn gene_calls(&self, extension: &str) -> PathBuf {
        self.gene_calls_dir()
            .join(format!("{}.{}", self.base, extension))
    }

    pub fn search_results(&self, database: Database) -> PathBuf {
        self.search_results_dir()
            .join(format!("{}.{}.hmmtbl", self.base, database.label()))
    }

    pub fn run_log(&self) -> PathBuf {
        self.root.join("info.log")
    }
}
