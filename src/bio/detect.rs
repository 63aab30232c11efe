//! Input format sniffing.
//!
//! Only the first record is inspected. Nucleotide input must be pure A/T/C/G/N;
//! protein input must look like gene-caller output (`<scaffold>_<n>` ids) and must
//! not be pure A/T/C/G/N.

use crate::bio::fasta::first_record;
use crate::bio::sequence::{gene_call_id, SequenceType};
use crate::AnnoshardError;
use std::path::Path;
use tracing::debug;

/// Check that `path` looks like `declared` input, failing with a format error otherwise
pub fn detect_format(path: &Path, declared: SequenceType) -> Result<(), AnnoshardError> {
    let mismatch = |reason: &str| {
        AnnoshardError::Format(format!(
            "input {} does not appear to be in \"{}\" format: {}",
            path.display(),
            declared,
            reason
        ))
    };

    let record = match first_record(path) {
        Ok(Some(record)) => record,
        Ok(None) => return Err(mismatch("no FASTA records found")),
        Err(AnnoshardError::Parse(msg)) => return Err(mismatch(&msg)),
        Err(e) => return Err(e),
    };

    if record.is_empty() {
        return Err(mismatch("first record has no sequence"));
    }

    match declared {
        SequenceType::Nucleotide => {
            if !record.is_nucleotide_alphabet() {
                return Err(mismatch("sequence contains symbols other than A, T, C, G, N"));
            }
        }
        SequenceType::Protein => {
            if !gene_call_id(&record.header).contains('_') {
                return Err(mismatch(
                    "protein ids must end in _<index> (e.g. scaffold_1)",
                ));
            }
            if record.is_nucleotide_alphabet() {
                return Err(mismatch("sequence looks like nucleotides"));
            }
        }
    }

    debug!("{} looks like {} input (first record: {})", path.display(), declared, record.header);
    Ok(())
}
