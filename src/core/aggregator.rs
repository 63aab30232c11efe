//! Whole-input reports built from the per-shard tables.
//!
//! Shard tables are concatenated in shard-index order under a fixed header.
//! Special-interest accessions are counted and joined against the pathway table.
//! Gene-call outputs (nucleotide input only) and raw search tables are merged
//! with whitespace placeholders decoded. The transient shard folders are removed
//! at the end whether or not every shard produced output.

use crate::bio::sequence::{decode_whitespace, SequenceType};
use crate::core::hits::{Database, HIT_TABLE_HEADER};
use crate::core::paths::OutputLayout;
use crate::core::reference::ReferenceTables;
use crate::utils::tsv::{append_lines, create_tsv, open_tsv};
use crate::AnnoshardError;
use indexmap::IndexMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const FULL_HEADER: [&str; 18] = [
    "protein", "scaffold",
    "KO", "AMG", "KO name", "KO evalue", "KO score", "KO v-score",
    "Pfam", "Pfam name", "Pfam evalue", "Pfam score", "Pfam v-score",
    "VOG", "VOG name", "VOG evalue", "VOG score", "VOG v-score",
];

pub const BEST_HEADER: [&str; 6] = ["protein", "scaffold", "accession", "name", "evalue", "score"];

pub const SPECIAL_INDIVIDUALS_HEADER: [&str; 6] = ["protein", "scaffold", "KO", "KO name", "evalue", "score"];

pub const SPECIAL_COUNTS_HEADER: [&str; 3] = ["AMG count", "AMG KO", "AMG KO name"];

pub const SPECIAL_PATHWAYS_HEADER: [&str; 5] = ["KEGG Entry", "Metabolism", "Pathway", "Total AMGs", "AMG KO"];

/// Gene-caller outputs merged for nucleotide input
const GENE_CALL_EXTENSIONS: [&str; 3] = ["faa", "ffn", "gff"];

/// Column of the accession in the special-interest individuals table
const SPECIAL_ACCESSION_COLUMN: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Rows in the best-annotation table
    pub proteins: usize,
    /// Rows in the special-interest individuals table
    pub special_interest: usize,
    /// Distinct special-interest accessions
    pub distinct_special_interest: usize,
}

pub struct Aggregator<'a> {
    layout: &'a OutputLayout,
    shards: &'a [String],
    refs: &'a ReferenceTables,
}

impl<'a> Aggregator<'a> {
    pub fn new(layout: &'a OutputLayout, shards: &'a [String], refs: &'a ReferenceTables) -> Self {
        Self { layout, shards, refs }
    }

    /// Build every final table, then delete the transient folders
    pub fn run(&self, sequence_type: SequenceType) -> Result<AggregateSummary, AnnoshardError> {
        let result = self.build(sequence_type);
        // Cleanup happens even if building failed part way
        match (result, self.cleanup()) {
            (Ok(summary), cleanup) => cleanup.map(|()| summary),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("Could not remove transient folders: {}", cleanup);
                Err(e)
            }
        }
    }

    fn build(&self, sequence_type: SequenceType) -> Result<AggregateSummary, AnnoshardError> {
        let summary = self.combine_annotations()?;
        if sequence_type == SequenceType::Nucleotide {
            self.combine_gene_calls()?;
        }
        self.combine_search_results()?;
        info!(
            "Aggregated {} proteins, {} special-interest hits ({} distinct)",
            summary.proteins, summary.special_interest, summary.distinct_special_interest
        );
        Ok(summary)
    }

    fn combine_annotations(&self) -> Result<AggregateSummary, AnnoshardError> {
        fs::create_dir_all(self.layout.annotations_dir())?;

        let shard_paths = |path_for: fn(&OutputLayout, &str) -> PathBuf| -> Vec<PathBuf> {
            self.shards.iter().map(|s| path_for(self.layout, s)).collect()
        };

        concatenate(
            &self.layout.full_annotations(),
            &FULL_HEADER,
            &shard_paths(OutputLayout::shard_full_path),
            false,
        )?;
        let proteins = concatenate(
            &self.layout.best_annotations(),
            &BEST_HEADER,
            &shard_paths(OutputLayout::shard_best_path),
            false,
        )?;
        let special_interest = concatenate(
            &self.layout.special_individuals(),
            &SPECIAL_INDIVIDUALS_HEADER,
            &shard_paths(OutputLayout::shard_special_path),
            false,
        )?;

        let counts = count_accessions(read_special_accessions(&self.layout.special_individuals())?);
        self.write_counts(&counts)?;
        self.write_pathways(&counts)?;

        Ok(AggregateSummary {
            proteins: proteins as usize,
            special_interest: special_interest as usize,
            distinct_special_interest: counts.len(),
        })
    }

    fn write_counts(&self, counts: &[(String, usize)]) -> Result<(), AnnoshardError> {
        let mut tsv = create_tsv(&self.layout.special_counts())?;
        tsv.write_record(SPECIAL_COUNTS_HEADER)?;
        for (accession, count) in counts {
            tsv.write_record([
                count.to_string().as_str(),
                accession.as_str(),
                self.refs.display_name(accession),
            ])?;
        }
        tsv.flush()?;
        Ok(())
    }

    fn write_pathways(&self, counts: &[(String, usize)]) -> Result<(), AnnoshardError> {
        let mut tsv = create_tsv(&self.layout.special_pathways())?;
        tsv.write_record(SPECIAL_PATHWAYS_HEADER)?;
        for row in pathway_rows(counts, self.refs) {
            tsv.write_record(&row)?;
        }
        tsv.flush()?;
        Ok(())
    }

    fn combine_gene_calls(&self) -> Result<(), AnnoshardError> {
        fs::create_dir_all(self.layout.gene_calls_dir())?;
        for extension in GENE_CALL_EXTENSIONS {
            let sources: Vec<PathBuf> = self
                .shards
                .iter()
                .map(|s| self.layout.split_dir().join(format!("{}.{}", s, extension)))
                .collect();
            let lines = concatenate(&self.layout.gene_calls(extension), &[], &sources, true)?;
            debug!("gene calls .{}: {} lines", extension, lines);
        }
        Ok(())
    }

    fn combine_search_results(&self) -> Result<(), AnnoshardError> {
        fs::create_dir_all(self.layout.search_results_dir())?;
        for database in Database::ALL {
            let sources: Vec<PathBuf> = self
                .shards
                .iter()
                .map(|s| self.layout.raw_table_path(s, database))
                .collect();
            let rows = concatenate(
                &self.layout.search_results(database),
                &HIT_TABLE_HEADER,
                &sources,
                true,
            )?;
            debug!("{} search results: {} rows", database, rows);
        }
        Ok(())
    }

    fn cleanup(&self) -> Result<(), AnnoshardError> {
        for dir in self.layout.transient_dirs() {
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Write `header` (when not empty) followed by every line of `sources`.
/// Missing sources are skipped with a warning. Returns the number of data lines.
fn concatenate(
    dest: &Path,
    header: &[&str],
    sources: &[PathBuf],
    decode: bool,
) -> Result<u64, AnnoshardError> {
    let mut writer = BufWriter::new(File::create(dest)?);
    if !header.is_empty() {
        writeln!(writer, "{}", header.join("\t"))?;
    }

    let mut lines = 0u64;
    for source in sources {
        if !source.exists() {
            warn!("{} is missing, skipped in {}", source.display(), dest.display());
            continue;
        }
        lines += if decode {
            append_lines(&mut writer, source, decode_whitespace)?
        } else {
            append_lines(&mut writer, source, str::to_string)?
        };
    }
    writer.flush()?;
    Ok(lines)
}

fn read_special_accessions(path: &Path) -> Result<Vec<String>, AnnoshardError> {
    let mut reader = open_tsv(path, true)?;
    let mut accessions = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(accession) = row.get(SPECIAL_ACCESSION_COLUMN).filter(|a| !a.is_empty()) {
            accessions.push(accession.to_string());
        }
    }
    Ok(accessions)
}

/// Occurrence count per accession, highest first; equal counts keep first-seen order
pub fn count_accessions<I>(accessions: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for accession in accessions {
        *counts.entry(accession).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// One row per (accession, pathway) pair; accessions without pathways get one
/// row with empty pathway fields
pub fn pathway_rows(counts: &[(String, usize)], refs: &ReferenceTables) -> Vec<[String; 5]> {
    let mut rows = Vec::new();
    for (accession, count) in counts {
        let pathways = refs.pathways(accession);
        if pathways.is_empty() {
            rows.push([
                String::new(),
                String::new(),
                String::new(),
                count.to_string(),
                accession.clone(),
            ]);
            continue;
        }
        for pathway in pathways {
            rows.push([
                pathway.entry.clone(),
                pathway.metabolism.clone(),
                pathway.name.clone(),
                count.to_string(),
                accession.clone(),
            ]);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::Pathway;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_sorted_descending_stable() {
        let counts = count_accessions(owned(&["K2", "K1", "K1", "K3", "K2", "K1"]));
        assert_eq!(
            counts,
            vec![("K1".to_string(), 3), ("K2".to_string(), 2), ("K3".to_string(), 1)]
        );

        let ties = count_accessions(owned(&["K9", "K4", "K7"]));
        let order: Vec<&str> = ties.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(order, vec!["K9", "K4", "K7"]);
    }

    #[test]
    fn test_pathway_rows_multi_and_missing() {
        let glycolysis = Pathway {
            entry: "map00010".to_string(),
            metabolism: "Carbohydrate".to_string(),
            name: "Glycolysis".to_string(),
        };
        let tca = Pathway {
            entry: "map00020".to_string(),
            metabolism: "Carbohydrate".to_string(),
            name: "TCA cycle".to_string(),
        };
        let refs = ReferenceTables::default()
            .with_pathway("K1", glycolysis)
            .with_pathway("K1", tca);

        let rows = pathway_rows(&[("K1".to_string(), 4), ("K5".to_string(), 1)], &refs);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "map00010");
        assert_eq!(rows[1][2], "TCA cycle");
        assert_eq!(rows[1][3], "4");
        assert_eq!(rows[2], ["", "", "", "1", "K5"].map(String::from));
    }

    #[test]
    fn test_concatenate_in_order_with_header() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.tsv");
        let b = dir.path().join("b.tsv");
        fs::write(&a, "x$~&1\t1\n").unwrap();
        fs::write(&b, "y\t2\nz\t3\n").unwrap();
        let dest = dir.path().join("out.tsv");

        let lines = concatenate(
            &dest,
            &["name", "value"],
            &[a, dir.path().join("missing.tsv"), b],
            true,
        )
        .unwrap();
        assert_eq!(lines, 3);
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "name\tvalue\nx 1\t1\ny\t2\nz\t3\n"
        );
    }

    #[test]
    fn test_cleanup_removes_transient_dirs() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "in");
        fs::create_dir_all(layout.split_dir()).unwrap();
        fs::create_dir_all(layout.annotations_temp_dir()).unwrap();
        let shards = vec!["shard_0".to_string()];
        let refs = ReferenceTables::default();

        // No shard produced anything; aggregation still writes headers and cleans up
        let summary = Aggregator::new(&layout, &shards, &refs)
            .run(SequenceType::Protein)
            .unwrap();
        assert_eq!(summary, AggregateSummary::default());
        for transient in layout.transient_dirs() {
            assert!(!transient.exists());
        }
        assert!(layout.best_annotations().exists());
        assert!(layout.search_results(Database::Kegg).exists());
        assert!(!layout.gene_calls_dir().exists());
    }

    #[test]
    fn test_build_error_survives_failed_cleanup() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "in");
        // A file where the annotations folder belongs stops the build,
        // and a file where a transient folder belongs stops the cleanup
        fs::write(layout.annotations_dir(), "").unwrap();
        fs::write(layout.split_dir(), "").unwrap();
        let shards = vec!["shard_0".to_string()];
        let refs = ReferenceTables::default();

        let result = Aggregator::new(&layout, &shards, &refs).run(SequenceType::Protein);
        match result {
            Err(AnnoshardError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::AlreadyExists),
            other => panic!("expected the build error, got {:?}", other),
        }
        assert!(layout.split_dir().is_file());
    }
}
