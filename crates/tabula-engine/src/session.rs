//! Run-wide mutable state threaded through every program frame.

use tabula_core::counters::Counters;
use tabula_core::enums::Status;
use tabula_vars::VariableEnvironment;

/// Everything that outlives a single program frame: the variable
/// environment, the session and reportable counter tiers, and the
/// session-termination flag.
///
/// One context is created per run and passed by `&mut` into every frame,
/// nested ones included.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub env: VariableEnvironment,
    session: Counters,
    reportable: Counters,
    terminated: bool,
}

impl SessionContext {
    pub fn new(env: VariableEnvironment) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    /// Count a picked-up instruction. Returns its session-wide step number.
    pub fn begin(&mut self, reportable: bool) -> u64 {
        self.session.begin();
        if reportable {
            self.reportable.begin();
        }
        self.session.done
    }

    /// Count the outcome of an instruction previously passed to [`begin`](Self::begin).
    pub fn record(&mut self, outcome: Status, reportable: bool) {
        self.session.record(outcome);
        if reportable {
            self.reportable.record(outcome);
        }
    }

    pub fn counters(&self) -> Counters {
        self.session
    }

    pub fn reportable(&self) -> Counters {
        self.reportable
    }

    /// Clear the reportable tier after a report has been emitted.
    pub fn reset_reportable(&mut self) {
        self.reportable.reset();
    }

    /// Stop every frame of this session after its current instruction.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Full session reset: counters, termination flag and every variable.
    pub fn reset(&mut self) {
        self.env.clear();
        self.session.reset();
        self.reportable.reset();
        self.terminated = false;
    }
}
