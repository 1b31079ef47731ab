//! [`Program`] -- an ordered run of instruction records at one nesting level.

use std::path::{Path, PathBuf};

use tabula_core::instruction::{InstructionRecord, InstructionRow};

/// The instruction that spawned a nested program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Session-wide step number of the spawning instruction.
    pub step: u64,
    pub level: usize,
    pub id: String,
    pub action: String,
}

impl ParentRef {
    pub fn of(record: &InstructionRecord) -> Self {
        Self {
            step: record.step(),
            level: record.level(),
            id: record.id().to_string(),
            action: record.action().to_string(),
        }
    }
}

/// Records sharing one nesting level, built once and consumed by exactly
/// one frame.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) name: String,
    pub(crate) source_dir: Option<PathBuf>,
    pub(crate) records: Vec<InstructionRecord>,
    pub(crate) level: usize,
    pub(crate) parent: Option<ParentRef>,
}

impl Program {
    /// An outermost program (level 1, no parent).
    pub fn new(name: impl Into<String>, rows: Vec<InstructionRow>) -> Self {
        Self {
            name: name.into(),
            source_dir: None,
            records: rows.into_iter().map(InstructionRecord::new).collect(),
            level: 1,
            parent: None,
        }
    }

    /// A program spawned by `parent`, one level below the parent record.
    pub fn child_of(
        parent: &InstructionRecord,
        name: impl Into<String>,
        rows: Vec<InstructionRow>,
    ) -> Self {
        Self {
            level: parent.level() + 1,
            parent: Some(ParentRef::of(parent)),
            ..Self::new(name, rows)
        }
    }

    /// Directory that relative `InputSpecs` paths resolve against.
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    /// Session step of the spawning instruction, 0 at the root.
    pub fn parent_step(&self) -> u64 {
        self.parent.as_ref().map_or(0, |p| p.step)
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
