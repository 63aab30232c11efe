//! Profile-search hit parsing.
//!
//! Turns the search tool's tabular output into a four column table
//! (`protein`, `accession`, `evalue`, `score`) and reduces it to one best row
//! per protein. The tabular format starts with a fixed preamble and ends with a
//! comment block; which column carries the accession depends on how the
//! database's profiles are named, so each database is parsed through a named
//! [`ColumnLayout`].

use crate::core::paths::OutputLayout;
use crate::utils::tsv::{create_tsv, format_float, open_tsv, tsv_writer};
use crate::AnnoshardError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Comment lines preceding the data rows of a tabular search result
pub const TBLOUT_PREAMBLE_LINES: usize = 3;

/// Header of every four column hit table
pub const HIT_TABLE_HEADER: [&str; 4] = ["protein", "accession", "evalue", "score"];

/// Column positions of the fields we keep from one tabular row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub query: usize,
    pub accession: usize,
    pub evalue: usize,
    pub score: usize,
}

impl Columns {
    fn width(&self) -> usize {
        self.query.max(self.accession).max(self.evalue).max(self.score) + 1
    }
}

/// The two observed table layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnLayout {
    /// Accession is the profile name (KEGG KOs, VOGs)
    QueryName,
    /// Accession is the profile accession column (Pfam `PF00001.1`)
    QueryAccession,
}

impl ColumnLayout {
    pub const fn columns(&self) -> Columns {
        match self {
            ColumnLayout::QueryName => Columns { query: 0, accession: 2, evalue: 4, score: 5 },
            ColumnLayout::QueryAccession => Columns { query: 0, accession: 3, evalue: 4, score: 5 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Database {
    Kegg,
    Pfam,
    Vog,
}

impl Database {
    /// Search order, which is also the winner-selection order
    pub const ALL: [Database; 3] = [Database::Kegg, Database::Pfam, Database::Vog];

    pub fn label(&self) -> &'static str {
        match self {
            Database::Kegg => "KEGG",
            Database::Pfam => "Pfam",
            Database::Vog => "VOG",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One search result row
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub query: String,
    pub accession: String,
    pub evalue: f64,
    pub score: f64,
}

impl Hit {
    pub fn new(query: &str, accession: &str, evalue: f64, score: f64) -> Self {
        Self {
            query: query.to_string(),
            accession: accession.to_string(),
            evalue,
            score,
        }
    }

    fn to_row(&self) -> [String; 4] {
        [
            self.query.clone(),
            self.accession.clone(),
            format_float(self.evalue),
            format_float(self.score),
        ]
    }
}

/// Best hit per protein for one database
pub type BestHits = HashMap<String, Hit>;

fn parse_number(field: &str, what: &str, line_number: usize) -> Result<f64, AnnoshardError> {
    field.parse::<f64>().map_err(|_| {
        AnnoshardError::Parse(format!(
            "line {}: invalid {} '{}'",
            line_number, what, field
        ))
    })
}

/// Parse the data rows of a tabular search result.
///
/// The first [`TBLOUT_PREAMBLE_LINES`] lines are skipped and parsing stops at the
/// first line starting with `#`.
pub fn parse_tblout<R: BufRead>(reader: R, layout: ColumnLayout) -> Result<Vec<Hit>, AnnoshardError> {
    let columns = layout.columns();
    let mut hits = Vec::new();

    for (idx, line) in reader.lines().enumerate().skip(TBLOUT_PREAMBLE_LINES) {
        let line = line?;
        let line_number = idx + 1;
        if line.starts_with('#') {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < columns.width() {
            return Err(AnnoshardError::Parse(format!(
                "line {}: expected at least {} columns, found {}",
                line_number,
                columns.width(),
                fields.len()
            )));
        }

        hits.push(Hit {
            query: fields[columns.query].to_string(),
            accession: fields[columns.accession].to_string(),
            evalue: parse_number(fields[columns.evalue], "e-value", line_number)?,
            score: parse_number(fields[columns.score], "score", line_number)?,
        });
    }

    Ok(hits)
}

/// Keep one hit per protein: lowest e-value wins, equal e-values keep the
/// earliest row. Output is in ascending e-value order.
pub fn best_hits(mut hits: Vec<Hit>) -> Vec<Hit> {
    // sort_by is stable, which is what makes ties deterministic
    hits.sort_by(|a, b| a.evalue.total_cmp(&b.evalue));
    let mut seen = HashSet::new();
    hits.retain(|hit| seen.insert(hit.query.clone()));
    hits
}

pub fn write_hits<W: Write>(writer: W, hits: &[Hit], header: bool) -> Result<(), AnnoshardError> {
    write_table(tsv_writer(writer), hits, header)
}

/// Load a best-hit table written by [`parse_shard`]
pub fn read_best_hits(path: &Path) -> Result<BestHits, AnnoshardError> {
    let mut reader = open_tsv(path, true)?;
    let mut best = BestHits::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let line_number = idx + 2;
        if row.len() < 4 {
            return Err(AnnoshardError::Parse(format!(
                "{}: line {} has {} columns, expected 4",
                path.display(),
                line_number,
                row.len()
            )));
        }
        let hit = Hit {
            query: row[0].to_string(),
            accession: row[1].to_string(),
            evalue: parse_number(&row[2], "e-value", line_number)?,
            score: parse_number(&row[3], "score", line_number)?,
        };
        best.entry(hit.query.clone()).or_insert(hit);
    }
    Ok(best)
}

/// Parse one shard's three search results.
///
/// Every database is handled on its own: a missing or malformed result leaves
/// empty tables for that database and is reported in the returned error, so the
/// annotation phase still sees every table it expects.
pub fn parse_shard(
    layout: &OutputLayout,
    base: &str,
    databases: &[(Database, ColumnLayout)],
) -> Result<(), AnnoshardError> {
    let mut problems = Vec::new();

    for &(database, columns) in databases {
        let source = layout.tblout_path(base, database);
        let parsed = File::open(&source)
            .map_err(AnnoshardError::from)
            .and_then(|file| parse_tblout(BufReader::new(file), columns));

        let hits = match parsed {
            Ok(hits) => hits,
            Err(e) => {
                warn!("{} {}: could not parse search output: {}", base, database, e);
                problems.push(format!("{}: {}", database, e));
                Vec::new()
            }
        };

        let raw = create_tsv(&layout.raw_table_path(base, database))?;
        write_table(raw, &hits, false)?;

        let best = best_hits(hits);
        debug!("{} {}: {} proteins with hits", base, database, best.len());
        let parsed = create_tsv(&layout.parsed_table_path(base, database))?;
        write_table(parsed, &best, true)?;
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AnnoshardError::Parse(problems.join("; ")))
    }
}

fn write_table<W: Write>(
    mut tsv: csv::Writer<W>,
    hits: &[Hit],
    header: bool,
) -> Result<(), AnnoshardError> {
    if header {
        tsv.write_record(HIT_TABLE_HEADER)?;
    }
    for hit in hits {
        tsv.write_record(hit.to_row())?;
    }
    tsv.flush()?;
    Ok(())
}
