//! The tabula interpreter.
//!
//! A [`Runner`] walks a [`Program`] of instruction records, dispatching each
//! to a handler from the [`ActionRegistry`], counting outcomes in three tiers
//! and applying post-test policy. The `RunProgram` action recurses into a
//! nested program that shares the same [`SessionContext`].
//!
//! ```no_run
//! use tabula_core::instruction::InstructionRow;
//! use tabula_engine::{Program, Runner};
//!
//! let runner = Runner::default();
//! let mut session = runner.new_session();
//! let program = Program::new(
//!     "hello",
//!     vec![
//!         InstructionRow::new("1", "SetVars").with_params("who=world"),
//!         InstructionRow::new("2", "Comment").with_description("hello {who}"),
//!     ],
//! );
//! let summary = runner.run(program, &mut session);
//! assert_eq!(summary.counters.pass, 2);
//! ```

pub mod actions;
pub mod capture;
pub mod error;
pub mod loader;
pub mod program;
pub mod registry;
pub mod report;
pub mod runner;
pub mod session;

pub use capture::{FailureCapture, NoCapture};
pub use error::{ActionError, LoadError, ReportError};
pub use loader::{InputSpec, LoadedSource, ProgramLoader, Provider, load_path};
pub use program::{ParentRef, Program};
pub use registry::{ActionContext, ActionHandler, ActionOutcome, ActionRegistry};
pub use report::{
    FrameState, FrameSummary, JsonlReporter, MemoryReporter, Outcome, Reporter, SessionSummary,
};
pub use runner::Runner;
pub use session::SessionContext;
