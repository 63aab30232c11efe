use crate::bio::sequence::Record;
use crate::AnnoshardError;
use needletail::errors::{ParseError, ParseErrorKind};
use needletail::{parse_fastx_reader, FastxReader};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Residues per line when writing records
pub const LINE_WIDTH: usize = 80;

fn parse_error(e: ParseError) -> AnnoshardError {
    AnnoshardError::Parse(format!("invalid FASTA: {}", e))
}

/// Streaming FASTA reader yielding one [`Record`] at a time.
///
/// Headers keep the whole line after `>` (whitespace included); sequence lines
/// are joined. An empty input yields no records.
pub struct FastaReader<'a> {
    inner: Option<Box<dyn FastxReader + 'a>>,
}

impl FastaReader<'static> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnnoshardError> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }
}

impl<'a> FastaReader<'a> {
    pub fn new<R: Read + Send + 'a>(reader: R) -> Result<Self, AnnoshardError> {
        match parse_fastx_reader(reader) {
            Ok(inner) => Ok(Self { inner: Some(inner) }),
            Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => Ok(Self { inner: None }),
            Err(e) => Err(parse_error(e)),
        }
    }
}

impl Iterator for FastaReader<'_> {
    type Item = Result<Record, AnnoshardError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.inner.as_mut()?.next()? {
            Ok(record) => {
                let id = record.id();
                let id = id.strip_suffix(b"\r").unwrap_or(id);
                let header = String::from_utf8_lossy(id).into_owned();
                Ok(Record::new(header, record.seq().into_owned()))
            }
            Err(e) => Err(parse_error(e)),
        };
        if result.is_err() {
            self.inner = None;
        }
        Some(result)
    }
}

/// Bytes [`write_record`] produces for a header and sequence of these sizes
pub fn record_bytes(header: &str, sequence_len: usize) -> u64 {
    let lines = sequence_len.div_ceil(LINE_WIDTH);
    (header.len() + 2 + sequence_len + lines) as u64
}

/// Write one record and return the number of bytes written
pub fn write_record<W: Write>(
    writer: &mut W,
    header: &str,
    sequence: &[u8],
) -> Result<u64, AnnoshardError> {
    writer.write_all(b">")?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(b"\n")?;
    for chunk in sequence.chunks(LINE_WIDTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(record_bytes(header, sequence.len()))
}

/// Read only the first record of a FASTA file
pub fn first_record<P: AsRef<Path>>(path: P) -> Result<Option<Record>, AnnoshardError> {
    FastaReader::from_path(path)?.next().transpose()
}

/// Collect every header of a FASTA file, in file order
pub fn read_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>, AnnoshardError> {
    FastaReader::from_path(path)?
        .map(|record| record.map(|r| r.header))
        .collect()
}
