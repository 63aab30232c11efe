use crate::core::hits::{ColumnLayout, Database};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub databases: DatabasesConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Gene caller binary (name on PATH or explicit path)
    #[serde(default = "default_gene_caller")]
    pub gene_caller: String,
    /// Profile search binary (name on PATH or explicit path)
    #[serde(default = "default_profile_search")]
    pub profile_search: String,
}

/// One profile database inside the database folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDatabaseConfig {
    /// Profile file name, relative to the database folder
    pub profile: String,
    /// Which tabular column carries the accession for this database
    pub layout: ColumnLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasesConfig {
    #[serde(default = "default_kegg")]
    pub kegg: ProfileDatabaseConfig,
    #[serde(default = "default_pfam")]
    pub pfam: ProfileDatabaseConfig,
    #[serde(default = "default_vog")]
    pub vog: ProfileDatabaseConfig,
}

/// File names of the reference tables inside the auxiliary folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_names")]
    pub names: String,
    #[serde(default = "default_special_interest")]
    pub special_interest: String,
    #[serde(default = "default_categories")]
    pub categories: String,
    #[serde(default = "default_pathways")]
    pub pathways: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bit score threshold handed to the profile search
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    /// Kill a worker after this many seconds (unset = wait indefinitely)
    #[serde(default)]
    pub worker_timeout_secs: Option<u64>,
    /// Upper bound on concurrently running workers per phase (unset = all units)
    #[serde(default)]
    pub max_concurrent_workers: Option<usize>,
}

fn default_gene_caller() -> String { "prodigal".to_string() }
fn default_profile_search() -> String { "hmmsearch".to_string() }
fn default_kegg() -> ProfileDatabaseConfig {
    ProfileDatabaseConfig {
        profile: "KEGG_profiles_prokaryotes.HMM".to_string(),
        layout: ColumnLayout::QueryName,
    }
}
fn default_pfam() -> ProfileDatabaseConfig {
    ProfileDatabaseConfig {
        profile: "Pfam-A_v32.HMM".to_string(),
        layout: ColumnLayout::QueryAccession,
    }
}
fn default_vog() -> ProfileDatabaseConfig {
    ProfileDatabaseConfig {
        profile: "VOGDB94_phage.HMM".to_string(),
        layout: ColumnLayout::QueryName,
    }
}
fn default_names() -> String { "VIBRANT_names.tsv".to_string() }
fn default_special_interest() -> String { "VIBRANT_AMGs.tsv".to_string() }
fn default_categories() -> String { "VIBRANT_categories.tsv".to_string() }
fn default_pathways() -> String { "VIBRANT_KEGG_pathways_summary.tsv".to_string() }
fn default_score_threshold() -> f64 { 40.0 }

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            gene_caller: default_gene_caller(),
            profile_search: default_profile_search(),
        }
    }
}

impl Default for DatabasesConfig {
    fn default() -> Self {
        Self {
            kegg: default_kegg(),
            pfam: default_pfam(),
            vog: default_vog(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            names: default_names(),
            special_interest: default_special_interest(),
            categories: default_categories(),
            pathways: default_pathways(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            worker_timeout_secs: None,
            max_concurrent_workers: None,
        }
    }
}

impl DatabasesConfig {
    pub fn get(&self, database: Database) -> &ProfileDatabaseConfig {
        match database {
            Database::Kegg => &self.kegg,
            Database::Pfam => &self.pfam,
            Database::Vog => &self.vog,
        }
    }

    /// Column layout of every database, in search order
    pub fn layouts(&self) -> Vec<(Database, ColumnLayout)> {
        Database::ALL
            .iter()
            .map(|&db| (db, self.get(db).layout))
            .collect()
    }
}

impl PipelineConfig {
    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), crate::AnnoshardError> {
        let threshold = self.pipeline.score_threshold;
        if !threshold.is_finite() {
            return Err(crate::AnnoshardError::Config(format!(
                "score_threshold must be a finite number, got {}",
                threshold
            )));
        }
        if self.pipeline.max_concurrent_workers == Some(0) {
            return Err(crate::AnnoshardError::Config(
                "max_concurrent_workers must be at least 1".to_string(),
            ));
        }
        if self.pipeline.worker_timeout_secs == Some(0) {
            return Err(crate::AnnoshardError::Config(
                "worker_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::AnnoshardError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::AnnoshardError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::AnnoshardError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::AnnoshardError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
