//! Action handlers, their registry, and dispatch of one record.

use std::collections::BTreeMap;
use std::path::Path;

use tabula_core::instruction::InstructionRecord;
use tabula_core::policy::Directive;
use tabula_vars::VariableEnvironment;
use tracing::{debug, warn};

use crate::actions;
use crate::error::ActionError;
use crate::loader::ProgramLoader;
use crate::program::Program;
use crate::report::FrameSummary;
use crate::runner::Runner;
use crate::session::SessionContext;

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Business result of one handler invocation.
///
/// A failed check is an entry in `errors`, not an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub comments: Vec<String>,
    pub errors: Vec<String>,
    /// Flow control requested by the handler, merged with the record's
    /// own post-test policy.
    pub directive: Directive,
}

impl ActionOutcome {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn comment(message: impl Into<String>) -> Self {
        Self::default().with_comment(message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::default().with_error(message)
    }

    pub fn with_comment(mut self, message: impl Into<String>) -> Self {
        self.comments.push(message.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = directive;
        self
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Executes one kind of instruction.
pub trait ActionHandler {
    /// Name rows use to select this handler (matched case-insensitively).
    fn name(&self) -> &str;

    /// Whether the handler drives an interactive surface, which makes it
    /// eligible for failure capture.
    fn requires_interactive_surface(&self) -> bool {
        false
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError>;
}

// ---------------------------------------------------------------------------
// Context handed to handlers
// ---------------------------------------------------------------------------

/// What a handler may touch while it runs.
pub struct ActionContext<'a> {
    runner: &'a Runner,
    session: &'a mut SessionContext,
    source_dir: Option<&'a Path>,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(
        runner: &'a Runner,
        session: &'a mut SessionContext,
        source_dir: Option<&'a Path>,
    ) -> Self {
        Self {
            runner,
            session,
            source_dir,
        }
    }

    pub fn env(&self) -> &VariableEnvironment {
        &self.session.env
    }

    pub fn env_mut(&mut self) -> &mut VariableEnvironment {
        &mut self.session.env
    }

    pub fn session(&self) -> &SessionContext {
        &*self.session
    }

    pub fn loader(&self) -> &ProgramLoader {
        self.runner.loader()
    }

    pub fn max_depth(&self) -> usize {
        self.runner.config().max_depth
    }

    /// Directory of the program currently running, if it came from a file.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir
    }

    /// Run `program` as a nested frame sharing this session.
    pub fn run_program(&mut self, program: Program) -> FrameSummary {
        self.runner.run_frame(program, &mut *self.session)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// What dispatch reports back to the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub directive: Directive,
    pub interactive: bool,
}

/// Name -> handler table, built once at startup.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in action.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        actions::register_builtins(&mut registry);
        registry
    }

    /// Add a handler, replacing any handler registered under the same name.
    pub fn register(&mut self, handler: impl ActionHandler + 'static) {
        let key = handler.name().to_ascii_lowercase();
        if self.handlers.insert(key, Box::new(handler)).is_some() {
            debug!("replaced previously registered action");
        }
    }

    pub fn with(mut self, handler: impl ActionHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn ActionHandler> {
        self.handlers
            .get(&name.trim().to_ascii_lowercase())
            .map(|h| &**h)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Handlers sorted by lower-cased name.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ActionHandler> {
        self.handlers.values().map(|h| &**h)
    }

    /// Registered names, as the handlers spell them.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Execute `record` with its handler and apply the outcome to it.
    ///
    /// Nothing escapes: a blank or unknown action and handler errors all
    /// end up recorded on the record.
    pub fn dispatch(&self, record: &mut InstructionRecord, ctx: &mut ActionContext<'_>) -> Dispatch {
        let action = record.action().to_string();
        if action.is_empty() {
            record.record_error("Action is required");
            return Dispatch::default();
        }
        let Some(handler) = self.get(&action) else {
            record.record_error(format!("Action not implemented: '{action}'"));
            return Dispatch::default();
        };
        let interactive = handler.requires_interactive_surface();

        match handler.execute(record, ctx) {
            Ok(outcome) => {
                for comment in outcome.comments {
                    record.record_comment(comment);
                }
                for error in outcome.errors {
                    record.record_error(error);
                }
                Dispatch {
                    directive: outcome.directive,
                    interactive,
                }
            }
            Err(e) if e.is_setup_error() => {
                record.record_error(e.to_string());
                Dispatch {
                    directive: Directive::default(),
                    interactive,
                }
            }
            Err(e) => {
                warn!(step = record.step(), action = %action, error = %e, "action raised an exception");
                record.record_exception(e.to_string());
                record.record_error(format!("{action} raised an exception: {e}"));
                Dispatch {
                    directive: Directive::default(),
                    interactive,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::enums::Status;
    use tabula_core::instruction::{InstructionRow, StepPosition};
    use tabula_core::params::ParamSyntax;

    struct Boom;

    impl ActionHandler for Boom {
        fn name(&self) -> &str {
            "Boom"
        }

        fn execute(
            &self,
            _record: &InstructionRecord,
            _ctx: &mut ActionContext<'_>,
        ) -> Result<ActionOutcome, ActionError> {
            Err(ActionError::Failed("kaboom".into()))
        }
    }

    struct NeedsName;

    impl ActionHandler for NeedsName {
        fn name(&self) -> &str {
            "NeedsName"
        }

        fn execute(
            &self,
            record: &InstructionRecord,
            _ctx: &mut ActionContext<'_>,
        ) -> Result<ActionOutcome, ActionError> {
            let name = record
                .param("name")
                .ok_or_else(|| ActionError::MissingParam("Name".into()))?;
            Ok(ActionOutcome::comment(format!("hello {name}")))
        }
    }

    fn dispatch(registry: &ActionRegistry, row: InstructionRow) -> InstructionRecord {
        let runner = Runner::default();
        let mut session = SessionContext::default();
        let mut record = InstructionRecord::new(row);
        record.initialize(
            StepPosition {
                seq: 1,
                level: 1,
                parent_step: 0,
                step: 1,
            },
            &session.env,
        );
        record.resolve_params(&mut session.env, &ParamSyntax::default());
        let mut ctx = ActionContext::new(&runner, &mut session, None);
        registry.dispatch(&mut record, &mut ctx);
        record
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = ActionRegistry::new().with(Boom);
        assert!(registry.contains("boom"));
        assert!(registry.contains(" BOOM "));
        assert_eq!(registry.names(), vec!["Boom"]);
    }

    #[test]
    fn builtins_are_registered() {
        let registry = ActionRegistry::with_builtins();
        for name in ["SetVars", "ClearVars", "Comment", "Verify", "Fail", "Pause", "RunProgram", "SetPolicy"] {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn unknown_action_is_a_recorded_error() {
        let record = dispatch(&ActionRegistry::new(), InstructionRow::new("1", "Nope"));
        assert_eq!(record.status(), Status::Fail);
        assert_eq!(record.errors(), ["Action not implemented: 'Nope'"]);
        assert!(record.exception().is_none());
    }

    #[test]
    fn blank_action_is_a_recorded_error() {
        let record = dispatch(&ActionRegistry::new(), InstructionRow::new("1", ""));
        assert_eq!(record.errors(), ["Action is required"]);
    }

    #[test]
    fn handler_error_becomes_exception_and_error() {
        let record = dispatch(&ActionRegistry::new().with(Boom), InstructionRow::new("1", "boom"));
        assert_eq!(record.status(), Status::Fail);
        assert_eq!(record.exception(), Some("kaboom"));
        assert_eq!(record.errors(), ["boom raised an exception: kaboom"]);
    }

    #[test]
    fn setup_error_has_no_exception() {
        let registry = ActionRegistry::new().with(NeedsName);
        let record = dispatch(&registry, InstructionRow::new("1", "NeedsName"));
        assert_eq!(record.errors(), ["missing required parameter 'Name'"]);
        assert!(record.exception().is_none());

        let record = dispatch(&registry, InstructionRow::new("1", "NeedsName").with_params("Name=ann"));
        assert_eq!(record.status(), Status::Pass);
        assert_eq!(record.comments(), ["hello ann"]);
    }
}
