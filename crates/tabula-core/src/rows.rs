//! Row sources: JSON Lines and tab-separated instruction files.
//!
//! A JSONL file holds one [`InstructionRow`] object per line. A TSV file
//! holds the eight positional columns per line; missing trailing columns are
//! blank, lines starting with `#` are comments, and a leading header row
//! (second column `action`) is skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

use crate::instruction::InstructionRow;

/// Error type for row source operations.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("unknown row format '{0}' (expected jsonl or tsv)")]
    UnknownFormat(String),
}

/// Result alias for row source operations.
pub type Result<T> = std::result::Result<T, RowError>;

/// On-disk layout of an instruction file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Jsonl,
    Tsv,
}

impl RowFormat {
    /// Guess the format from a file extension: `.jsonl`/`.json` is JSONL,
    /// anything else is tab-separated.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl" | "json") => Self::Jsonl,
            _ => Self::Tsv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Tsv => "tsv",
        }
    }
}

impl FromStr for RowFormat {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::Jsonl),
            "tsv" | "tab" => Ok(Self::Tsv),
            other => Err(RowError::UnknownFormat(other.to_string())),
        }
    }
}

/// Read every row from `path` in the given format.
pub fn read_rows_file(path: &Path, format: RowFormat) -> Result<Vec<InstructionRow>> {
    let reader = BufReader::new(File::open(path)?);
    match format {
        RowFormat::Jsonl => read_jsonl(reader).collect(),
        RowFormat::Tsv => read_tsv(reader).collect(),
    }
}

// -- JSONL ------------------------------------------------------------------

/// Writes rows as JSONL to the given writer.
pub fn write_jsonl<W: Write>(writer: &mut W, rows: &[InstructionRow]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        serde_json::to_writer(&mut *writer, row).map_err(|e| RowError::Json {
            line: i + 1,
            source: e,
        })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Returns an iterator that reads rows from a JSONL reader.
///
/// Empty lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> JsonlRows<R> {
    JsonlRows {
        reader,
        line_number: 0,
    }
}

/// Iterator over JSONL-encoded rows.
pub struct JsonlRows<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> Iterator for JsonlRows<R> {
    type Item = Result<InstructionRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|e| RowError::Json {
                        line: self.line_number,
                        source: e,
                    }));
                }
                Err(e) => return Some(Err(RowError::Io(e))),
            }
        }
    }
}

// -- TSV --------------------------------------------------------------------

/// Returns an iterator that reads rows from a tab-separated reader.
pub fn read_tsv<R: BufRead>(reader: R) -> TsvRows<R> {
    TsvRows {
        reader,
        seen_data: false,
    }
}

/// Iterator over tab-separated rows.
pub struct TsvRows<R> {
    reader: R,
    seen_data: bool,
}

impl<R: BufRead> Iterator for TsvRows<R> {
    type Item = Result<InstructionRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = line.trim_end_matches(['\r', '\n']);
                    if line.trim().is_empty() || line.trim_start().starts_with('#') {
                        continue;
                    }
                    let fields: Vec<&str> = line.split('\t').collect();
                    let first = !self.seen_data;
                    self.seen_data = true;
                    if first && is_header(&fields) {
                        continue;
                    }
                    return Some(Ok(InstructionRow::from_fields(&fields)));
                }
                Err(e) => return Some(Err(RowError::Io(e))),
            }
        }
    }
}

fn is_header(fields: &[&str]) -> bool {
    fields
        .get(1)
        .is_some_and(|f| f.trim().eq_ignore_ascii_case("action"))
}

/// Writes rows as tab-separated lines with a header.
pub fn write_tsv<W: Write>(writer: &mut W, rows: &[InstructionRow]) -> Result<()> {
    writeln!(
        writer,
        "id\taction\tlocatorKind\tlocatorSpec\tqueryFunction\tactivationFlag\tparameters\tdescription"
    )?;
    for row in rows {
        writeln!(writer, "{}", row.fields().join("\t"))?;
    }
    writer.flush()?;
    Ok(())
}
