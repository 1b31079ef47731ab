//! Ayu color theme and styling for tabula run output.
//!
//! Only failures and warnings draw the eye; passes get a green mark and
//! skips are muted. Small Unicode symbols for icons, no emoji.

use owo_colors::OwoColorize;
use tabula_core::counters::Counters;
use tabula_core::enums::Status;
use tabula_core::instruction::StepResult;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // ✓
pub const ICON_WARN: &str = "\u{26A0}"; // ⚠
pub const ICON_FAIL: &str = "\u{2716}"; // ✖
pub const ICON_SKIP: &str = "-";

/// Indent for each nesting level below the outermost program.
pub const LEVEL_INDENT: &str = "  ";
/// Prefix for comment and error lines under a step.
pub const TREE_CHILD: &str = "\u{23BF} "; // ⎿

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Status rendering
// ---------------------------------------------------------------------------

pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Pass => ICON_PASS,
        Status::Fail => ICON_FAIL,
        Status::Skip => ICON_SKIP,
    }
}

/// Colored icon for a step status.
pub fn render_status_icon(status: Status) -> String {
    let icon = status_icon(status);
    match status {
        Status::Pass => color_str(icon, PASS),
        Status::Fail => color_bold_str(icon, FAIL),
        Status::Skip => color_str(icon, MUTED),
    }
}

/// Colored `PASS`/`FAIL`/`SKIP` label.
pub fn render_status(status: Status) -> String {
    let s = status.as_str();
    match status {
        Status::Pass => color_str(s, PASS),
        Status::Fail => color_bold_str(s, FAIL),
        Status::Skip => color_str(s, MUTED),
    }
}

/// Renders `done=N pass=N fail=N skip=N`, coloring non-zero failures.
pub fn render_counters(counters: &Counters) -> String {
    let fail = format!("fail={}", counters.fail);
    let fail = if counters.fail > 0 {
        render_fail(&fail)
    } else {
        fail
    };
    format!(
        "done={} pass={} {} skip={}",
        counters.done, counters.pass, fail, counters.skip
    )
}

// ---------------------------------------------------------------------------
// Step rendering
// ---------------------------------------------------------------------------

/// Renders one executed step, indented by nesting level, followed by its
/// comments (muted), errors and exception (red) on their own lines.
///
/// Format: `{icon} {step:>4} {id} {action} {STATUS}  {description}`
pub fn render_step(step: &StepResult) -> String {
    let indent = LEVEL_INDENT.repeat(step.level.saturating_sub(1));
    let mut head = format!(
        "{indent}{} {:>4} {} {} {}",
        render_status_icon(step.status),
        step.step,
        render_muted(&step.id),
        render_bold(&step.action),
        render_status(step.status),
    );
    if !step.description.is_empty() {
        head.push_str("  ");
        head.push_str(&step.description);
    }

    let mut lines = vec![head];
    let sub = format!("{indent}       {TREE_CHILD}");
    for comment in &step.comments {
        lines.push(format!("{sub}{}", render_muted(comment)));
    }
    for error in &step.errors {
        lines.push(format!("{sub}{}", render_fail(error)));
    }
    if let Some(exception) = &step.exception {
        lines.push(format!("{sub}{} {}", render_warn(ICON_WARN), render_fail(exception)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn step(status: Status) -> StepResult {
        StepResult {
            seq: 1,
            level: 2,
            step: 7,
            parent_step: 3,
            id: "login".into(),
            action: "Verify".into(),
            description: "check title".into(),
            status,
            comments: vec!["verified equals".into()],
            errors: vec![],
            exception: None,
        }
    }

    #[test]
    fn status_icons() {
        assert_eq!(status_icon(Status::Pass), ICON_PASS);
        assert_eq!(status_icon(Status::Fail), ICON_FAIL);
        assert_eq!(status_icon(Status::Skip), ICON_SKIP);
    }

    #[test]
    fn render_status_contains_label() {
        assert!(render_status(Status::Fail).contains("FAIL"));
        assert!(render_status(Status::Skip).contains("SKIP"));
    }

    #[test]
    fn render_counters_contains_every_tier_value() {
        let counters = Counters {
            done: 4,
            pass: 2,
            fail: 1,
            skip: 1,
        };
        let rendered = render_counters(&counters);
        for part in ["done=4", "pass=2", "fail=1", "skip=1"] {
            assert!(rendered.contains(part), "{rendered}");
        }
    }

    #[test]
    fn render_step_indents_nested_levels_and_lists_notes() {
        let mut failed = step(Status::Fail);
        failed.errors.push("expected 'a' but was 'b'".into());
        failed.exception = Some("boom".into());

        let rendered = render_step(&failed);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(LEVEL_INDENT));
        assert!(lines[0].contains("login"));
        assert!(lines[0].contains("check title"));
        assert!(lines[1].contains("verified equals"));
        assert!(lines[2].contains("expected 'a' but was 'b'"));
        assert!(lines[3].contains("boom"));
    }
}
