//! Failure capture hook (screenshots and the like) for actions that drive an
//! interactive surface.

use std::io;
use std::path::PathBuf;

use tabula_core::instruction::InstructionRecord;

/// Produces an artefact for a record. The runner decides *when* to call it
/// based on the configured screenshot policy; the returned path is recorded
/// as a comment on the record.
pub trait FailureCapture {
    fn capture(&self, record: &InstructionRecord) -> io::Result<Option<PathBuf>>;
}

/// Captures nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl FailureCapture for NoCapture {
    fn capture(&self, _record: &InstructionRecord) -> io::Result<Option<PathBuf>> {
        Ok(None)
    }
}
