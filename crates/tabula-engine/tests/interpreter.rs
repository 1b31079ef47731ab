//! Whole-program tests for the interpreter: counters, skip and termination
//! policy, nesting, and the variable pipeline.

use std::cell::Cell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tabula_config::RunnerConfig;
use tabula_core::counters::Counters;
use tabula_core::enums::Status;
use tabula_core::instruction::{InstructionRecord, InstructionRow};
use tabula_engine::runner::FORCED_SKIP_COMMENT;
use tabula_engine::{
    ActionContext, ActionError, ActionHandler, ActionOutcome, ActionRegistry, FailureCapture,
    FrameState, MemoryReporter, Outcome, Program, ProgramLoader, ReportError, Reporter, Runner,
    SessionContext, SessionSummary, load_path,
};
use tabula_vars::Clock;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row(id: &str, action: &str) -> InstructionRow {
    InstructionRow::new(id, action)
}

/// Run `rows` as the outermost program of a fresh session.
fn run_rows(runner: Runner, rows: Vec<InstructionRow>) -> (SessionSummary, MemoryReporter, SessionContext) {
    let reporter = MemoryReporter::new();
    let runner = runner.with_reporter(reporter.clone());
    let mut session = runner.new_session();
    let summary = runner.run(Program::new("main", rows), &mut session);
    (summary, reporter, session)
}

fn run(rows: Vec<InstructionRow>) -> (SessionSummary, MemoryReporter, SessionContext) {
    run_rows(Runner::default(), rows)
}

fn counters(done: u64, pass: u64, fail: u64, skip: u64) -> Counters {
    Counters {
        done,
        pass,
        fail,
        skip,
    }
}

struct Explode;

impl ActionHandler for Explode {
    fn name(&self) -> &str {
        "Explode"
    }

    fn execute(
        &self,
        _record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        Err(ActionError::Failed("boom".into()))
    }
}

/// Stand-in for a handler that drives a UI.
struct Click;

impl ActionHandler for Click {
    fn name(&self) -> &str {
        "Click"
    }

    fn requires_interactive_surface(&self) -> bool {
        true
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        if record.locator_spec() == "#missing" {
            Ok(ActionOutcome::error("element not found"))
        } else {
            Ok(ActionOutcome::pass())
        }
    }
}

/// Raises the shared interrupt flag, as a Ctrl+C handler would.
struct RaiseInterrupt(Arc<AtomicBool>);

impl ActionHandler for RaiseInterrupt {
    fn name(&self) -> &str {
        "RaiseInterrupt"
    }

    fn execute(
        &self,
        _record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        self.0.store(true, Ordering::SeqCst);
        Ok(ActionOutcome::pass())
    }
}

/// Counts calls and hands back a fake screenshot path.
#[derive(Clone, Default)]
struct CountingCapture {
    calls: Rc<Cell<u32>>,
}

impl FailureCapture for CountingCapture {
    fn capture(&self, record: &InstructionRecord) -> io::Result<Option<PathBuf>> {
        self.calls.set(self.calls.get() + 1);
        Ok(Some(PathBuf::from(format!("shots/{}.png", record.step()))))
    }
}

struct BrokenReporter;

impl Reporter for BrokenReporter {
    fn on_frame(&self, _frame: &tabula_engine::FrameSummary) -> Result<(), ReportError> {
        Err(ReportError::Io(io::Error::other("disk full")))
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[test]
fn rows_without_action_are_not_counted() {
    let (summary, reporter, _) = run(vec![
        row("1", "Comment"),
        row("2", ""),
        row("3", "Comment").with_activation("no"),
    ]);
    assert_eq!(summary.counters, counters(2, 1, 0, 1));
    assert_eq!(summary.outcome, Outcome::Passed);

    // Sequence numbers keep the row position.
    let steps = reporter.steps();
    assert_eq!(steps.iter().map(|s| s.seq).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(steps.iter().map(|s| s.step).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(steps[1].status, Status::Skip);
}

#[test]
fn counters_are_conserved_across_nesting() {
    let loader = ProgramLoader::new().with_inline(
        "child",
        vec![row("c1", "Comment"), row("c2", "Fail").with_params("Message=nope")],
    );
    let (summary, reporter, _) = run_rows(
        Runner::default().with_loader(loader),
        vec![
            row("1", "Comment"),
            row("2", "RunProgram").with_params("InputSpecs=inline:child"),
            row("3", "Comment"),
        ],
    );

    let frames = reporter.frames();
    let (child, root) = (&frames[0], &frames[1]);
    assert_eq!(child.counters, counters(2, 1, 1, 0));
    assert_eq!(root.counters, counters(3, 3, 0, 0));
    assert_eq!(summary.counters, counters(5, 4, 1, 0));
    assert_eq!(summary.counters.done, root.counters.done + child.counters.done);
    assert!(child.counters.is_balanced() && root.counters.is_balanced());

    // The child runs between the parent's second and third instruction.
    assert_eq!(child.level, 2);
    assert_eq!(child.parent_step, 2);
    assert_eq!(child.steps.iter().map(|s| s.step).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(root.steps[2].step, 5);

    // Child failure is informational on the parent record.
    let call = &root.steps[1];
    assert_eq!(call.status, Status::Pass);
    assert_eq!(
        call.comments[0],
        "nested program 'child' completed: done=2 pass=1 fail=1 skip=0"
    );
    assert_eq!(summary.outcome, Outcome::Failed);
}

#[test]
fn unreported_actions_stay_out_of_the_reportable_tier() {
    let config = RunnerConfig {
        unreported_actions: vec!["comment".into()],
        ..RunnerConfig::default()
    };
    let (summary, reporter, session) = run_rows(
        Runner::new(config).unwrap(),
        vec![
            row("1", "Comment"),
            row("2", "Verify").with_params("Actual=a;Expected=a"),
        ],
    );
    assert_eq!(summary.counters.done, 2);
    assert_eq!(reporter.frames()[0].reportable, counters(1, 1, 0, 0));
    // Emitting the frame report resets the reportable tier.
    assert_eq!(session.reportable(), Counters::default());
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[test]
fn unset_variable_substitutes_to_empty() {
    let (summary, _, _) = run(vec![row("1", "Verify").with_params("Actual={x};Mode=empty")]);
    assert_eq!(summary.outcome, Outcome::Passed);
}

#[test]
fn duplicate_parameters_fail_without_dispatch() {
    let (summary, reporter, session) = run(vec![row("1", "SetVars").with_params("a=1;b=2;a=3")]);
    assert_eq!(summary.counters, counters(1, 0, 1, 0));
    assert_eq!(session.env.get("a"), "");
    assert_eq!(
        reporter.steps()[0].errors,
        vec!["invalid parameters: duplicate parameter 'a'".to_string()]
    );
}

#[test]
fn substitution_sees_values_from_earlier_steps_only() {
    let (summary, reporter, session) = run(vec![
        row("1", "SetVars").with_params("x=1"),
        row("2", "SetVars").with_params("x=2;y={x}"),
        row("3", "Verify").with_params("Actual={y};Expected=1"),
        row("4", "Verify").with_params("Actual={X};Expected=2"),
        row("5", "Comment").with_description("x is {x}"),
    ]);
    assert_eq!(summary.outcome, Outcome::Passed, "{:?}", reporter.steps());
    assert_eq!(session.env.get("y"), "1");
    assert_eq!(reporter.steps()[4].comments, vec!["x is 2".to_string()]);
}

#[test]
fn date_token_expands_against_fixed_clock() {
    let runner = Runner::default();
    let mut session = runner.new_session();
    session
        .env
        .set_clock(Clock::Fixed(Utc.with_ymd_and_hms(2014, 2, 6, 12, 0, 0).unwrap()));

    let summary = runner.run(
        Program::new(
            "dates",
            vec![
                row("1", "SetVars").with_params("Next=%date+1years,year,long%"),
                row("2", "Verify").with_params("Actual={$longyear};Expected=2015"),
            ],
        ),
        &mut session,
    );
    assert_eq!(summary.outcome, Outcome::Passed);
    assert_eq!(session.env.get("next"), "2015");
    assert_eq!(session.env.get("$longyear"), "2015");
}

#[test]
fn clear_vars_removes_named_variables() {
    let (summary, _, session) = run(vec![
        row("1", "SetVars").with_params("a=1;b=2;c=3"),
        row("2", "ClearVars").with_params("Names=a, c"),
        row("3", "Verify").with_params("Actual={a}{b}{c};Expected=2"),
    ]);
    assert_eq!(summary.outcome, Outcome::Passed);
    assert_eq!(session.env.len(), 1);
}

// ---------------------------------------------------------------------------
// Skip policy
// ---------------------------------------------------------------------------

#[test]
fn handler_skip_directive_skips_next_instruction() {
    let (summary, reporter, _) = run(vec![
        row("1", "SetVars").with_params("a=1"),
        row("2", "SetPolicy").with_params("Skip=1"),
        row("3", "Comment"),
    ]);
    assert_eq!(summary.counters, counters(3, 2, 0, 1));
    let skipped = &reporter.steps()[2];
    assert_eq!(skipped.status, Status::Skip);
    assert_eq!(skipped.comments, vec![FORCED_SKIP_COMMENT.to_string()]);
}

#[test]
fn skip_policy_overrides_activation_then_resumes() {
    let (summary, reporter, _) = run(vec![
        row("1", "SetVars").with_params("a=1;OnPass=skip:2"),
        row("2", "Fail").with_description("forced skip still sees a={a}"),
        row("3", "Fail").with_activation("yes"),
        row("4", "Fail").with_params("Message=runs"),
    ]);
    assert_eq!(summary.counters, counters(4, 1, 1, 2));

    let steps = reporter.steps();
    assert_eq!(
        steps.iter().map(|s| s.status).collect::<Vec<_>>(),
        vec![Status::Pass, Status::Skip, Status::Skip, Status::Fail]
    );
    assert_eq!(steps[1].description, "forced skip still sees a=1");
    assert_eq!(steps[3].errors, vec!["runs".to_string()]);
}

#[test]
fn inactive_rows_skip_without_parsing_parameters() {
    let (summary, reporter, session) = run(vec![
        row("1", "SetVars").with_params("a=1;a=2").with_activation("no"),
        row("2", "SetVars")
            .with_params("N=%date+5years,year,long%")
            .with_activation("off"),
        row("3", "SetVars").with_params("When=%date+1eons%").with_activation("false"),
    ]);
    assert_eq!(summary.counters, counters(3, 0, 0, 3));
    assert_eq!(summary.outcome, Outcome::Passed);
    assert!(reporter.steps().iter().all(|s| s.errors.is_empty()));
    assert_eq!(session.env.get("$longyear"), "");
    assert_eq!(session.env.get("n"), "");
}

#[test]
fn forced_skips_ignore_malformed_parameters() {
    let (summary, reporter, session) = run(vec![
        row("1", "SetPolicy").with_params("Skip=2"),
        row("2", "SetVars").with_params("a=1;a=2"),
        row("3", "SetVars").with_params("N=%date+5years,year,long%"),
        row("4", "Comment"),
    ]);
    assert_eq!(summary.counters, counters(4, 2, 0, 2));

    let steps = reporter.steps();
    assert_eq!(steps[1].status, Status::Skip);
    assert_eq!(steps[2].status, Status::Skip);
    assert!(steps[1].errors.is_empty());
    assert_eq!(session.env.get("$longyear"), "");
}

// ---------------------------------------------------------------------------
// Termination policy
// ---------------------------------------------------------------------------

#[test]
fn quit_case_on_failure_stops_the_program() {
    let (summary, reporter, _) = run(vec![
        row("1", "Fail").with_params("OnFail=quitcase"),
        row("2", "Comment"),
    ]);
    assert_eq!(summary.counters, counters(1, 0, 1, 0));
    assert_eq!(summary.outcome, Outcome::Failed);

    let frame = &reporter.frames()[0];
    assert_eq!(frame.state, FrameState::CaseTerminated);
    // The frame had failed, so the blurb is an error.
    assert_eq!(frame.errors, vec!["level 1 stopped by quitcase at step 1 (id '1')".to_string()]);
    assert!(frame.comments.is_empty());
}

#[test]
fn termination_can_follow_a_passing_instruction() {
    let (summary, reporter, _) = run(vec![
        row("1", "Comment").with_params("OnPass=quitsession"),
        row("2", "Comment"),
    ]);
    assert_eq!(summary.counters, counters(1, 1, 0, 0));
    assert_eq!(summary.outcome, Outcome::Terminated);
    assert_eq!(summary.outcome.exit_code(), 1);

    let frame = &reporter.frames()[0];
    assert_eq!(frame.state, FrameState::SessionTerminated);
    assert_eq!(frame.comments.len(), 1);
    // The triggering record is not changed after it was counted.
    assert!(frame.steps[0].errors.is_empty());
}

#[test]
fn child_case_termination_does_not_stop_parent() {
    let loader = ProgramLoader::new().with_inline(
        "child",
        vec![row("c1", "SetPolicy").with_params("QuitCase=yes"), row("c2", "Comment")],
    );
    let (summary, reporter, _) = run_rows(
        Runner::default().with_loader(loader),
        vec![
            row("1", "RunProgram").with_params("InputSpecs=inline:child"),
            row("2", "Comment"),
        ],
    );
    let frames = reporter.frames();
    assert_eq!(frames[0].state, FrameState::CaseTerminated);
    assert_eq!(frames[0].counters.done, 1);
    assert_eq!(frames[1].state, FrameState::Completed);
    assert_eq!(frames[1].counters.done, 2);
    assert_eq!(summary.counters.done, 3);
    assert_eq!(summary.outcome, Outcome::Passed);
}

#[test]
fn session_termination_cascades_through_every_frame() {
    let loader = ProgramLoader::new()
        .with_inline(
            "middle",
            vec![
                row("m1", "RunProgram").with_params("InputSpecs=inline:inner"),
                row("m2", "Comment"),
            ],
        )
        .with_inline("inner", vec![row("q", "SetPolicy").with_params("QuitSession=yes")]);
    let (summary, reporter, session) = run_rows(
        Runner::default().with_loader(loader),
        vec![
            row("r1", "RunProgram").with_params("InputSpecs=inline:middle"),
            row("r2", "Comment"),
        ],
    );

    let frames = reporter.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(
        frames.iter().map(|f| f.level).collect::<Vec<_>>(),
        vec![3, 2, 1]
    );
    for frame in &frames {
        assert!(frame.state.is_finished());
        assert_eq!(frame.state, FrameState::SessionTerminated);
        // Nothing after the point of invocation ran.
        assert_eq!(frame.steps.len(), 1);
    }
    assert_eq!(
        frames[0].comments,
        vec!["level 3 stopped by quitsession at step 3 (id 'q')".to_string()]
    );
    assert_eq!(
        frames[1].comments,
        vec!["level 2 stopped by quitsession in nested program at step 2 (id 'm1')".to_string()]
    );

    assert!(session.is_terminated());
    assert_eq!(summary.counters, counters(3, 3, 0, 0));
    assert!(summary.terminated);
    assert_eq!(summary.outcome, Outcome::Terminated);
    assert_eq!(reporter.sessions(), vec![summary]);
}

#[test]
fn interrupt_stops_every_frame_before_the_next_instruction() {
    let flag = Arc::new(AtomicBool::new(false));
    let loader = ProgramLoader::new().with_inline(
        "child",
        vec![row("c1", "RaiseInterrupt"), row("c2", "Comment")],
    );
    let registry = ActionRegistry::with_builtins().with(RaiseInterrupt(flag.clone()));
    let runner = Runner::default()
        .with_registry(registry)
        .with_loader(loader)
        .with_interrupt(flag);
    let (summary, reporter, _) = run_rows(
        runner,
        vec![
            row("1", "RunProgram").with_params("InputSpecs=inline:child"),
            row("2", "Comment"),
        ],
    );

    let frames = reporter.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].state, FrameState::SessionTerminated);
    assert_eq!(
        frames[0].comments,
        vec!["level 2 interrupted before instruction 2".to_string()]
    );
    assert_eq!(frames[1].state, FrameState::SessionTerminated);
    assert_eq!(
        frames[1].comments,
        vec!["level 1 stopped by interrupt at step 1 (id '1')".to_string()]
    );
    assert_eq!(summary.counters, counters(2, 2, 0, 0));
    assert_eq!(summary.outcome, Outcome::Terminated);
}

#[test]
fn raised_interrupt_runs_nothing() {
    let runner = Runner::default().with_interrupt(Arc::new(AtomicBool::new(true)));
    let (summary, reporter, _) = run_rows(runner, vec![row("1", "Comment")]);
    assert_eq!(summary.counters, counters(0, 0, 0, 0));
    assert_eq!(summary.outcome, Outcome::Terminated);
    assert!(reporter.steps().is_empty());
}

// ---------------------------------------------------------------------------
// Exceptions and nesting limits
// ---------------------------------------------------------------------------

#[test]
fn child_exception_surfaces_as_error_on_parent() {
    let registry = ActionRegistry::with_builtins().with(Explode);
    let loader = ProgramLoader::new().with_inline("child", vec![row("c1", "Explode")]);
    let (summary, reporter, _) = run_rows(
        Runner::default().with_registry(registry).with_loader(loader),
        vec![
            row("1", "RunProgram").with_params("InputSpecs=inline:child"),
            row("2", "Comment"),
        ],
    );

    let frames = reporter.frames();
    let inner = &frames[0].steps[0];
    assert_eq!(inner.exception.as_deref(), Some("boom"));

    let call = &frames[1].steps[0];
    assert_eq!(call.status, Status::Fail);
    assert!(call.exception.as_deref().unwrap().contains("boom"));
    assert!(call.errors[0].starts_with("RunProgram raised an exception"));

    // An exception never aborts the enclosing program.
    assert_eq!(frames[1].steps.len(), 2);
    assert_eq!(summary.counters, counters(3, 1, 2, 0));
}

#[test]
fn runaway_nesting_stops_at_max_depth() {
    let config = RunnerConfig {
        max_depth: 2,
        ..RunnerConfig::default()
    };
    let loader = ProgramLoader::new().with_inline(
        "again",
        vec![row("loop", "RunProgram").with_params("InputSpecs=inline:again")],
    );
    let (summary, reporter, _) = run_rows(
        Runner::new(config).unwrap().with_loader(loader),
        vec![row("start", "RunProgram").with_params("InputSpecs=inline:again")],
    );

    let frames = reporter.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[0].steps[0].exception.as_deref(),
        Some("nesting level 3 exceeds max-depth 2")
    );
    assert_eq!(summary.counters, counters(2, 0, 2, 0));
}

#[test]
fn unknown_nested_program_is_a_setup_error() {
    let (summary, reporter, _) = run(vec![row("1", "RunProgram").with_params("InputSpecs=inline:ghost")]);
    let step = &reporter.steps()[0];
    assert_eq!(step.status, Status::Fail);
    assert!(step.exception.is_none());
    assert!(step.errors[0].contains("inline program 'ghost' is not registered"));
    assert_eq!(summary.outcome, Outcome::Failed);
}

#[test]
fn nested_file_resolves_relative_to_parent_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.tsv"),
        "id\taction\tlocatorKind\tlocatorSpec\tqueryFunction\tactivationFlag\tparameters\tdescription\n\
         1\tRunProgram\t\t\t\t\tInputSpecs=jsonl:child.jsonl\tcall child\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("child.jsonl"),
        "{\"id\":\"c1\",\"action\":\"Comment\",\"description\":\"in child\"}\n",
    )
    .unwrap();

    let program = load_path(&dir.path().join("main.tsv")).unwrap().into_program();
    let runner = Runner::default();
    let mut session = runner.new_session();
    let summary = runner.run(program, &mut session);
    assert_eq!(summary.counters, counters(2, 2, 0, 0));
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[test]
fn failure_capture_runs_for_failing_interactive_actions() {
    let capture = CountingCapture::default();

    let registry = ActionRegistry::with_builtins().with(Click);
    let (_, reporter, _) = run_rows(
        Runner::default().with_registry(registry).with_capture(capture.clone()),
        vec![
            row("1", "Click").with_locator("css", "#ok"),
            row("2", "Click").with_locator("css", "#missing"),
            row("3", "Fail"),
        ],
    );
    assert_eq!(capture.calls.get(), 1);
    let steps = reporter.steps();
    assert!(steps[0].comments.is_empty());
    assert_eq!(steps[1].comments, vec!["captured shots/2.png".to_string()]);
    assert!(steps[2].comments.is_empty());
}

#[test]
fn broken_reporter_does_not_fail_the_run() {
    let runner = Runner::default().with_reporter(BrokenReporter);
    let mut session = runner.new_session();
    let summary = runner.run(Program::new("main", vec![row("1", "Comment")]), &mut session);
    assert_eq!(summary.outcome, Outcome::Passed);
}
