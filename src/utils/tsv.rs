//! Tab-separated table helpers shared by every phase

use crate::AnnoshardError;
use csv::{QuoteStyle, Reader, ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Unquoted tab-separated writer
pub fn tsv_writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .from_writer(inner)
}

pub fn create_tsv(path: &Path) -> Result<Writer<BufWriter<File>>, AnnoshardError> {
    Ok(tsv_writer(BufWriter::new(File::create(path)?)))
}

/// Unquoted tab-separated reader tolerating ragged rows
pub fn tsv_reader<R: Read>(inner: R, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(has_headers)
        .from_reader(inner)
}

pub fn open_tsv(path: &Path, has_headers: bool) -> Result<Reader<File>, AnnoshardError> {
    Ok(tsv_reader(File::open(path)?, has_headers))
}

/// Render a float the way the reports expect: scientific notation for very small
/// or very large magnitudes, plain decimal otherwise
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && (magnitude < 1e-4 || magnitude >= 1e16) {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

/// Append the lines of `source` to `dest`, passing each through `map`
pub fn append_lines<W, F>(dest: &mut W, source: &Path, map: F) -> Result<u64, AnnoshardError>
where
    W: Write,
    F: Fn(&str) -> String,
{
    let reader = BufReader::new(File::open(source)?);
    let mut lines = 0u64;
    for line in reader.lines() {
        let line = line?;
        dest.write_all(map(&line).as_bytes())?;
        dest.write_all(b"\n")?;
        lines += 1;
    }
    Ok(lines)
}
