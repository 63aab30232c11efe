//! Byte-balanced input sharding.
//!
//! Size targets come from the bytes the shards will actually hold: nucleotide
//! input is sized in a first pass over the records as they will be written,
//! protein input is first rewritten into a normalized copy. Every record is then
//! appended to the current shard. Once a shard holds at least
//! `ceil(total_bytes / max_shards)` bytes the next record starts a new shard,
//! except that the last allowed shard takes whatever remains. Protein input is sharded by scaffold: the shard index may only move
//! forward between two records of different scaffolds.

use crate::bio::fasta::{record_bytes, write_record, FastaReader};
use crate::bio::sequence::{encode_whitespace, gene_call_id, group_id, SequenceType};
use crate::AnnoshardError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One independently processed slice of the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub index: usize,
    /// Base name shared by every file derived from this shard
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct ShardSet {
    pub target_bytes: u64,
    pub sequence_type: SequenceType,
    /// Shards in index order
    pub shards: Vec<Shard>,
}

impl ShardSet {
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shards.iter().map(|s| s.name.as_str())
    }

    pub fn total_records(&self) -> usize {
        self.shards.iter().map(|s| s.records).sum()
    }
}

/// Name of the temporary normalized protein copy inside the shard folder
const NORMALIZED_PROTEINS: &str = "normalized_input.faa";

pub fn shard_name(index: usize) -> String {
    format!("shard_{}", index)
}

/// Running state of the sharding fold
#[derive(Debug, Default)]
struct ShardCursor {
    index: usize,
    bytes: u64,
    previous_group: Option<String>,
}

impl ShardCursor {
    /// Move to the next shard if the current one is full, there is a shard left,
    /// and the record does not continue the previous record's group
    fn advance_if_full(&mut self, group: Option<&str>, target: u64, max_shards: usize) -> bool {
        let group_changed = match (group, self.previous_group.as_deref()) {
            (Some(current), Some(previous)) => current != previous,
            _ => true,
        };
        if self.bytes >= target && self.index + 1 < max_shards && group_changed {
            self.index += 1;
            self.bytes = 0;
            true
        } else {
            false
        }
    }
}

struct OpenShard {
    shard: Shard,
    writer: BufWriter<File>,
}

impl OpenShard {
    fn create(dir: &Path, index: usize, extension: &str) -> Result<Self, AnnoshardError> {
        let name = shard_name(index);
        let path = dir.join(format!("{}.{}", name, extension));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self {
            shard: Shard {
                index,
                name,
                path,
                bytes: 0,
                records: 0,
            },
            writer,
        })
    }

    fn finish(mut self) -> Result<Shard, AnnoshardError> {
        self.writer.flush()?;
        Ok(self.shard)
    }
}

pub struct Sharder {
    dir: PathBuf,
    max_shards: usize,
}

impl Sharder {
    /// Shards are written into `dir`, which must already exist
    pub fn new<P: AsRef<Path>>(dir: P, max_shards: usize) -> Result<Self, AnnoshardError> {
        if max_shards == 0 {
            return Err(AnnoshardError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            max_shards,
        })
    }

    pub fn shard(&self, input: &Path, sequence_type: SequenceType) -> Result<ShardSet, AnnoshardError> {
        let set = match sequence_type {
            SequenceType::Nucleotide => self.shard_nucleotide(input)?,
            SequenceType::Protein => self.shard_protein(input)?,
        };
        info!(
            "Split {} records into {} shard(s) of ~{} bytes",
            set.total_records(),
            set.len(),
            set.target_bytes
        );
        Ok(set)
    }

    fn shard_nucleotide(&self, input: &Path) -> Result<ShardSet, AnnoshardError> {
        let total = written_size(input, encode_whitespace)?;
        self.distribute(input, SequenceType::Nucleotide, total, encode_whitespace)
    }

    fn shard_protein(&self, input: &Path) -> Result<ShardSet, AnnoshardError> {
        // Header edits change byte counts, so size targets come from the normalized copy
        let normalized = self.dir.join(NORMALIZED_PROTEINS);
        let total = normalize_proteins(input, &normalized)?;
        let result = self.distribute(&normalized, SequenceType::Protein, total, str::to_string);
        fs::remove_file(&normalized)?;
        result
    }

    fn distribute<F>(
        &self,
        source: &Path,
        sequence_type: SequenceType,
        total_bytes: u64,
        header_for: F,
    ) -> Result<ShardSet, AnnoshardError>
    where
        F: Fn(&str) -> String,
    {
        let target = total_bytes.div_ceil(self.max_shards as u64);
        let grouped = sequence_type == SequenceType::Protein;
        let extension = sequence_type.shard_extension();

        let mut cursor = ShardCursor::default();
        let mut current: Option<OpenShard> = None;
        let mut shards = Vec::new();

        for record in FastaReader::from_path(source)? {
            let record = record?;
            let header = header_for(&record.header);
            let group = grouped.then(|| group_id(&header).to_string());

            if current.is_some() && cursor.advance_if_full(group.as_deref(), target, self.max_shards) {
                if let Some(open) = current.take() {
                    shards.push(open.finish()?);
                }
            }

            if current.is_none() {
                current = Some(OpenShard::create(&self.dir, cursor.index, extension)?);
            }
            if let Some(open) = current.as_mut() {
                let written = write_record(&mut open.writer, &header, &record.sequence)?;
                open.shard.bytes += written;
                open.shard.records += 1;
                cursor.bytes += written;
            }
            cursor.previous_group = group;
        }

        if let Some(open) = current.take() {
            shards.push(open.finish()?);
        }

        for shard in &shards {
            debug!("{}: {} records, {} bytes", shard.name, shard.records, shard.bytes);
        }

        Ok(ShardSet {
            target_bytes: target,
            sequence_type,
            shards,
        })
    }
}

/// Rewrite protein input with headers cut at the gene-caller delimiter and
/// whitespace encoded; returns the size of the copy
fn normalize_proteins(input: &Path, dest: &Path) -> Result<u64, AnnoshardError> {
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut total = 0u64;
    for record in FastaReader::from_path(input)? {
        let record = record?;
        let header = encode_whitespace(gene_call_id(&record.header));
        total += write_record(&mut writer, &header, &record.sequence)?;
    }
    writer.flush()?;
    Ok(total)
}

/// Bytes the shards will hold in total once records are rewritten
fn written_size<F>(source: &Path, header_for: F) -> Result<u64, AnnoshardError>
where
    F: Fn(&str) -> String,
{
    let mut total = 0u64;
    for record in FastaReader::from_path(source)? {
        let record = record?;
        total += record_bytes(&header_for(&record.header), record.sequence.len());
    }
    Ok(total)
}
