//! Cross-database annotation of one shard.
//!
//! Every protein present in the shard's translations gets exactly one record,
//! with or without hits. The winning annotation is chosen by walking the
//! databases in order (KEGG, Pfam, VOG): the first hit seeds the winner and each
//! later hit whose score is greater than or equal to the current winner's
//! replaces it, so ties go to the later database. The special-interest flag comes
//! from the KEGG hit alone.

use crate::bio::fasta::read_headers;
use crate::bio::sequence::{decode_whitespace, gene_call_id, group_id};
use crate::core::hits::{read_best_hits, BestHits, Database, Hit};
use crate::core::paths::OutputLayout;
use crate::core::reference::ReferenceTables;
use crate::utils::tsv::{create_tsv, format_float};
use crate::AnnoshardError;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Best hit of one protein in each database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryHits {
    pub kegg: Option<Hit>,
    pub pfam: Option<Hit>,
    pub vog: Option<Hit>,
}

impl QueryHits {
    pub fn get(&self, database: Database) -> Option<&Hit> {
        match database {
            Database::Kegg => self.kegg.as_ref(),
            Database::Pfam => self.pfam.as_ref(),
            Database::Vog => self.vog.as_ref(),
        }
    }

    fn slot_mut(&mut self, database: Database) -> &mut Option<Hit> {
        match database {
            Database::Kegg => &mut self.kegg,
            Database::Pfam => &mut self.pfam,
            Database::Vog => &mut self.vog,
        }
    }

    /// The winning hit and the database it came from
    pub fn winner(&self) -> Option<(Database, &Hit)> {
        let mut winner: Option<(Database, &Hit)> = None;
        for database in Database::ALL {
            if let Some(hit) = self.get(database) {
                let promote = match winner {
                    None => true,
                    Some((_, current)) => hit.score >= current.score,
                };
                if promote {
                    winner = Some((database, hit));
                }
            }
        }
        winner
    }
}

/// Group best-hit tables by protein, one pass per database
pub fn collect_hits<I>(tables: I) -> HashMap<String, QueryHits>
where
    I: IntoIterator<Item = (Database, BestHits)>,
{
    let mut by_query: HashMap<String, QueryHits> = HashMap::new();
    for (database, best) in tables {
        for (query, hit) in best {
            *by_query.entry(query).or_default().slot_mut(database) = Some(hit);
        }
    }
    by_query
}

/// Final annotation of one protein
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    /// Protein id with whitespace restored
    pub query: String,
    pub group: String,
    pub hits: QueryHits,
    pub special_interest: bool,
}

impl AnnotationRecord {
    pub fn new(encoded_query: &str, hits: QueryHits, refs: &ReferenceTables) -> Self {
        let query = decode_whitespace(encoded_query);
        let group = group_id(&query).to_string();
        let special_interest = hits
            .kegg
            .as_ref()
            .is_some_and(|hit| refs.is_special_interest(&hit.accession));
        Self {
            query,
            group,
            hits,
            special_interest,
        }
    }

    pub fn winner(&self) -> Option<(Database, &Hit)> {
        self.hits.winner()
    }

    /// protein, scaffold, then KEGG (with the special-interest marker), Pfam and VOG blocks
    pub fn full_row(&self, refs: &ReferenceTables) -> Vec<String> {
        let mut row = vec![self.query.clone(), self.group.clone()];
        for database in Database::ALL {
            let hit = self.hits.get(database);
            row.push(hit.map(|h| h.accession.clone()).unwrap_or_default());
            if database == Database::Kegg {
                row.push(if self.special_interest { "AMG" } else { "" }.to_string());
            }
            match hit {
                Some(hit) => {
                    row.push(refs.display_name(&hit.accession).to_string());
                    row.push(format_float(hit.evalue));
                    row.push(format_float(hit.score));
                    row.push(format_float(refs.category_weight(&hit.accession)));
                }
                None => row.extend(std::iter::repeat(String::new()).take(4)),
            }
        }
        row
    }

    /// protein, scaffold, accession, name, evalue, score of the winner
    pub fn best_row(&self, refs: &ReferenceTables) -> Vec<String> {
        let mut row = vec![self.query.clone(), self.group.clone()];
        match self.winner() {
            Some((_, hit)) => row.extend([
                hit.accession.clone(),
                refs.display_name(&hit.accession).to_string(),
                format_float(hit.evalue),
                format_float(hit.score),
            ]),
            None => row.extend(std::iter::repeat(String::new()).take(4)),
        }
        row
    }

    /// KEGG hit of a flagged protein, whichever database won
    pub fn special_interest_row(&self, refs: &ReferenceTables) -> Option<Vec<String>> {
        if !self.special_interest {
            return None;
        }
        let kegg = self.hits.kegg.as_ref()?;
        Some(vec![
            self.query.clone(),
            self.group.clone(),
            kegg.accession.clone(),
            refs.display_name(&kegg.accession).to_string(),
            format_float(kegg.evalue),
            format_float(kegg.score),
        ])
    }
}

/// Build the records for `queries` (in order) from the grouped hits
pub fn annotate<'a, I>(
    queries: I,
    hits: HashMap<String, QueryHits>,
    refs: &ReferenceTables,
) -> Vec<AnnotationRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    queries
        .into_iter()
        .map(|query| {
            // A repeated protein id gets the same hits on every row
            let query_hits = hits.get(query).cloned().unwrap_or_default();
            AnnotationRecord::new(query, query_hits, refs)
        })
        .collect()
}

/// Annotate one shard and write its full, best and special-interest tables.
/// Returns the number of proteins annotated.
pub fn annotate_shard(
    layout: &OutputLayout,
    shard: &str,
    refs: &ReferenceTables,
) -> Result<usize, AnnoshardError> {
    let headers = read_headers(layout.shard_proteins(shard))?;
    let queries: Vec<&str> = headers.iter().map(|h| gene_call_id(h)).collect();

    let mut tables = Vec::with_capacity(Database::ALL.len());
    for database in Database::ALL {
        let path = layout.parsed_table_path(shard, database);
        let best = if path.exists() {
            read_best_hits(&path)?
        } else {
            warn!("{} {}: no parsed hits, treating as empty", shard, database);
            BestHits::new()
        };
        tables.push((database, best));
    }

    let records = annotate(queries.iter().copied(), collect_hits(tables), refs);

    let mut full = create_tsv(&layout.shard_full_path(shard))?;
    let mut best = create_tsv(&layout.shard_best_path(shard))?;
    let mut special = create_tsv(&layout.shard_special_path(shard))?;
    let mut flagged = 0usize;

    for record in &records {
        full.write_record(record.full_row(refs))?;
        best.write_record(record.best_row(refs))?;
        if let Some(row) = record.special_interest_row(refs) {
            special.write_record(row)?;
            flagged += 1;
        }
    }
    full.flush()?;
    best.flush()?;
    special.flush()?;

    debug!("{}: annotated {} proteins ({} flagged)", shard, records.len(), flagged);
    Ok(records.len())
}
