//! Resolution of `InputSpecs` references into instruction rows.
//!
//! A spec has the shape `<provider>:<source>`:
//!
//! - `jsonl:<path>` / `tsv:<path>` read a file. Relative paths are tried
//!   against the referencing program's directory first, then as given.
//! - `inline:<name>` looks up rows registered with
//!   [`ProgramLoader::register_inline`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tabula_core::instruction::InstructionRow;
use tabula_core::rows::{RowFormat, read_rows_file};
use tracing::debug;

use crate::error::LoadError;
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Jsonl,
    Tsv,
    Inline,
}

impl FromStr for Provider {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::Jsonl),
            "tsv" => Ok(Self::Tsv),
            "inline" => Ok(Self::Inline),
            other => Err(LoadError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jsonl => "jsonl",
            Self::Tsv => "tsv",
            Self::Inline => "inline",
        })
    }
}

/// A parsed `InputSpecs` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub provider: Provider,
    pub source: String,
}

impl FromStr for InputSpec {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, source) = s
            .split_once(':')
            .filter(|(_, source)| !source.trim().is_empty())
            .ok_or_else(|| LoadError::InvalidSpec(s.to_string()))?;
        Ok(Self {
            provider: provider.parse()?,
            source: source.trim().to_string(),
        })
    }
}

/// Rows resolved from a spec, ready to become a [`Program`].
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub name: String,
    pub rows: Vec<InstructionRow>,
    /// Directory of the file the rows came from, if any.
    pub dir: Option<PathBuf>,
}

impl LoadedSource {
    /// An outermost program built from these rows.
    pub fn into_program(self) -> Program {
        let program = Program::new(self.name, self.rows);
        match self.dir {
            Some(dir) => program.with_source_dir(dir),
            None => program,
        }
    }
}

/// Turns `InputSpecs` values and file paths into rows.
#[derive(Debug, Clone, Default)]
pub struct ProgramLoader {
    inline: HashMap<String, Vec<InstructionRow>>,
}

impl ProgramLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `rows` available as `inline:<name>`. Names are case-insensitive.
    pub fn register_inline(&mut self, name: &str, rows: Vec<InstructionRow>) {
        self.inline.insert(name.trim().to_ascii_lowercase(), rows);
    }

    pub fn with_inline(mut self, name: &str, rows: Vec<InstructionRow>) -> Self {
        self.register_inline(name, rows);
        self
    }

    /// Resolve an `InputSpecs` value. `base_dir` is the directory of the
    /// program holding the reference.
    pub fn resolve(&self, spec: &str, base_dir: Option<&Path>) -> Result<LoadedSource, LoadError> {
        let spec: InputSpec = spec.parse()?;
        debug!(provider = %spec.provider, source = %spec.source, "resolving input spec");
        match spec.provider {
            Provider::Inline => {
                let rows = self
                    .inline
                    .get(&spec.source.to_ascii_lowercase())
                    .ok_or_else(|| LoadError::NotRegistered(spec.source.clone()))?;
                Ok(LoadedSource {
                    name: spec.source,
                    rows: rows.clone(),
                    dir: base_dir.map(Path::to_path_buf),
                })
            }
            Provider::Jsonl => load_file(&locate(&spec.source, base_dir), RowFormat::Jsonl),
            Provider::Tsv => load_file(&locate(&spec.source, base_dir), RowFormat::Tsv),
        }
    }
}

/// Read a program file, choosing the format from its extension.
pub fn load_path(path: &Path) -> Result<LoadedSource, LoadError> {
    load_file(path, RowFormat::from_path(path))
}

fn load_file(path: &Path, format: RowFormat) -> Result<LoadedSource, LoadError> {
    let rows = read_rows_file(path, format).map_err(|source| LoadError::Rows {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), format = format.as_str(), "loaded program");
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(LoadedSource {
        name,
        rows,
        dir: path.parent().map(Path::to_path_buf),
    })
}

fn locate(source: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(source);
    if path.is_relative() {
        if let Some(candidate) = base_dir.map(|dir| dir.join(&path)) {
            if candidate.exists() {
                return candidate;
            }
        }
    }
    path
}
