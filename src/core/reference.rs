//! Read-only reference tables used to name, weight and flag accessions.
//!
//! Lookups never fail: an accession missing from a table resolves to
//! [`UNKNOWN_NAME`], weight 0, not special-interest, and no pathways.

use crate::core::config::ReferenceConfig;
use crate::utils::tsv::tsv_reader;
use crate::AnnoshardError;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Display name for accessions without a curated name
pub const UNKNOWN_NAME: &str = "hypothetical protein";

/// Separator between accessions inside one pathway row
pub const PATHWAY_MEMBER_SEPARATOR: char = '~';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pathway {
    pub entry: String,
    pub metabolism: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    names: HashMap<String, String>,
    categories: HashMap<String, f64>,
    special_interest: HashSet<String>,
    pathways: HashMap<String, Vec<Pathway>>,
}

impl ReferenceTables {
    /// Load all four tables from the auxiliary folder
    pub fn load(dir: &Path, files: &ReferenceConfig) -> Result<Self, AnnoshardError> {
        let open = |name: &str| -> Result<BufReader<File>, AnnoshardError> {
            let path = dir.join(name);
            File::open(&path).map(BufReader::new).map_err(|e| {
                AnnoshardError::Precondition(format!("cannot read {}: {}", path.display(), e))
            })
        };

        let tables = Self {
            names: parse_names(open(&files.names)?)?,
            categories: parse_categories(open(&files.categories)?)?,
            special_interest: parse_special_interest(open(&files.special_interest)?)?,
            pathways: parse_pathways(open(&files.pathways)?)?,
        };
        debug!(
            "Reference tables: {} names, {} weights, {} special-interest, {} pathway accessions",
            tables.names.len(),
            tables.categories.len(),
            tables.special_interest.len(),
            tables.pathways.len()
        );
        Ok(tables)
    }

    pub fn with_names<I, K, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.names
            .extend(names.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_categories<I, K>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.categories
            .extend(weights.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn with_special_interest<I, K>(mut self, accessions: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.special_interest
            .extend(accessions.into_iter().map(Into::into));
        self
    }

    pub fn with_pathway(mut self, accession: &str, pathway: Pathway) -> Self {
        self.pathways
            .entry(accession.to_string())
            .or_default()
            .push(pathway);
        self
    }

    pub fn display_name(&self, accession: &str) -> &str {
        self.names
            .get(accession)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Category weight in [0, 1]; reporting only
    pub fn category_weight(&self, accession: &str) -> f64 {
        self.categories.get(accession).copied().unwrap_or(0.0)
    }

    pub fn is_special_interest(&self, accession: &str) -> bool {
        self.special_interest.contains(accession)
    }

    pub fn pathways(&self, accession: &str) -> &[Pathway] {
        self.pathways
            .get(accession)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// `accession<TAB>name`, one per line
pub fn parse_names<R: Read>(reader: R) -> Result<HashMap<String, String>, AnnoshardError> {
    let mut names = HashMap::new();
    for row in tsv_reader(reader, false).records() {
        let row = row?;
        if row.len() < 2 || row[0].is_empty() {
            continue;
        }
        names.insert(row[0].to_string(), row[1].to_string());
    }
    Ok(names)
}

/// Header line, then `accession<TAB>percent`; weights are stored as fractions
pub fn parse_categories<R: Read>(reader: R) -> Result<HashMap<String, f64>, AnnoshardError> {
    let mut weights = HashMap::new();
    for (idx, row) in tsv_reader(reader, true).records().enumerate() {
        let row = row?;
        if row.len() < 2 || row[0].is_empty() {
            continue;
        }
        let percent: f64 = row[1].trim().parse().map_err(|_| {
            AnnoshardError::Parse(format!(
                "category table line {}: invalid weight '{}'",
                idx + 2,
                &row[1]
            ))
        })?;
        weights.insert(row[0].to_string(), percent / 100.0);
    }
    Ok(weights)
}

/// Header line, then one accession per line
pub fn parse_special_interest<R: Read>(reader: R) -> Result<HashSet<String>, AnnoshardError> {
    let mut accessions = HashSet::new();
    for line in BufReader::new(reader).lines().skip(1) {
        let line = line?;
        let accession = line.trim();
        if !accession.is_empty() {
            accessions.insert(accession.to_string());
        }
    }
    Ok(accessions)
}

/// `entry<TAB>metabolism<TAB>pathway<TAB>acc~acc~...`; one accession may appear in many rows
pub fn parse_pathways<R: Read>(reader: R) -> Result<HashMap<String, Vec<Pathway>>, AnnoshardError> {
    let mut pathways: HashMap<String, Vec<Pathway>> = HashMap::new();
    for (idx, row) in tsv_reader(reader, false).records().enumerate() {
        let row = row?;
        if row.len() < 4 {
            return Err(AnnoshardError::Parse(format!(
                "pathway table line {}: expected 4 columns, found {}",
                idx + 1,
                row.len()
            )));
        }
        let pathway = Pathway {
            entry: row[0].to_string(),
            metabolism: row[1].to_string(),
            name: row[2].to_string(),
        };
        for accession in row[3].split(PATHWAY_MEMBER_SEPARATOR) {
            if accession.is_empty() {
                continue;
            }
            pathways
                .entry(accession.to_string())
                .or_default()
                .push(pathway.clone());
        }
    }
    Ok(pathways)
}
