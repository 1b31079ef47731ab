//! `(done, pass, fail, skip)` counters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::Status;

/// One tier of step counters.
///
/// `done` is bumped when an instruction is picked up; exactly one of
/// `pass`/`fail`/`skip` is bumped once its outcome is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub done: u64,
    pub pass: u64,
    pub fail: u64,
    pub skip: u64,
}

impl Counters {
    pub fn begin(&mut self) {
        self.done += 1;
    }

    pub fn record(&mut self, outcome: Status) {
        match outcome {
            Status::Pass => self.pass += 1,
            Status::Fail => self.fail += 1,
            Status::Skip => self.skip += 1,
        }
    }

    /// `done == pass + fail + skip`.
    pub fn is_balanced(&self) -> bool {
        self.done == self.pass + self.fail + self.skip
    }

    pub fn has_failures(&self) -> bool {
        self.fail > 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "done={} pass={} fail={} skip={}",
            self.done, self.pass, self.fail, self.skip
        )
    }
}
