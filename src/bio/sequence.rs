use serde::{Deserialize, Serialize};
use std::fmt;

/// Token substituted for spaces in headers before they reach tools that split on whitespace
pub const WHITESPACE_PLACEHOLDER: &str = "$~&";

/// Field delimiter the gene caller appends after each protein id
pub const GENE_CALL_DELIMITER: &str = " # ";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub header: String,
    pub sequence: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum SequenceType {
    /// Scaffolds or genomes; proteins are called before searching
    #[value(name = "nucl", alias = "nucleotide")]
    Nucleotide,
    /// Proteins already called from scaffolds (`<scaffold>_<n>` ids)
    #[value(name = "prot", alias = "protein")]
    Protein,
}

impl SequenceType {
    pub fn name(&self) -> &'static str {
        match self {
            SequenceType::Nucleotide => "nucl",
            SequenceType::Protein => "prot",
        }
    }

    /// Extension used for shard files of this type
    pub fn shard_extension(&self) -> &'static str {
        match self {
            SequenceType::Nucleotide => "fna",
            SequenceType::Protein => "faa",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Record {
    pub fn new(header: String, sequence: Vec<u8>) -> Self {
        Self { header, sequence }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// True when every residue is one of A, T, C, G or N (any case)
    pub fn is_nucleotide_alphabet(&self) -> bool {
        self.sequence
            .iter()
            .all(|c| matches!(c.to_ascii_uppercase(), b'A' | b'T' | b'C' | b'G' | b'N'))
    }
}

/// Replace every space with [`WHITESPACE_PLACEHOLDER`]
pub fn encode_whitespace(header: &str) -> String {
    header.replace(' ', WHITESPACE_PLACEHOLDER)
}

/// Inverse of [`encode_whitespace`]
pub fn decode_whitespace(text: &str) -> String {
    text.replace(WHITESPACE_PLACEHOLDER, " ")
}

/// Protein id without the coordinate fields the gene caller appends
pub fn gene_call_id(header: &str) -> &str {
    header
        .split_once(GENE_CALL_DELIMITER)
        .map(|(id, _)| id)
        .unwrap_or(header)
}

/// Scaffold a protein was called from: the id with its trailing `_<index>` removed
pub fn group_id(query: &str) -> &str {
    query.rsplit_once('_').map(|(group, _)| group).unwrap_or(query)
}
