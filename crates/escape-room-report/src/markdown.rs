//! Markdown report generation.
//!
//! [`MarkdownGenerator`] renders either a single grading result or a whole
//! session. A grading report includes:
//!
//! - The score with its breakdown table
//! - Correct, missed and unnecessary picks with rationales
//! - The improved approach and implementation gotchas
//! - The admin roles needed for the correct picks
//!
//! # Example
//!
//! ```rust
//! use escape_room_engine::{grade_submission, ContentStore};
//! use escape_room_report::MarkdownGenerator;
//!
//! let content = ContentStore::builtin().unwrap();
//! let result = grade_submission(&content, "scenario-3-dlp-tripwires", &["dlp-policy-alignment"]).unwrap();
//!
//! let markdown = MarkdownGenerator::for_result("DLP Tripwires", &result).generate();
//! assert!(markdown.contains("# DLP Tripwires"));
//! ```

use chrono::{DateTime, Utc};
use escape_room_engine::{ControlFeedback, GradingResult};
use std::fmt::Write;

use crate::SessionReport;

enum Source<'a> {
    Result {
        title: &'a str,
        result: &'a GradingResult,
    },
    Session(&'a SessionReport),
}

/// Generates Markdown reports from grading results and sessions.
pub struct MarkdownGenerator<'a> {
    source: Source<'a>,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a generator for one grading result, titled `title`.
    #[must_use]
    pub const fn for_result(title: &'a str, result: &'a GradingResult) -> Self {
        Self {
            source: Source::Result { title, result },
        }
    }

    /// Creates a generator for a session summary.
    #[must_use]
    pub const fn for_session(report: &'a SessionReport) -> Self {
        Self {
            source: Source::Session(report),
        }
    }

    /// Generates the complete Markdown report, ending with a timestamped footer.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = self.generate_body();
        Self::write_footer(&mut output);
        output
    }

    fn generate_body(&self) -> String {
        let mut output = String::new();

        match self.source {
            Source::Result { title, result } => {
                let _ = writeln!(output, "# {}\n", escape_markdown(title));
                write_score(&mut output, result);
                write_picks(&mut output, "Correct Picks", &result.correct_picks);
                write_picks(&mut output, "Missed Picks", &result.missed_picks);
                write_picks(&mut output, "Unnecessary Picks", &result.unnecessary_picks);
                write_improved_approach(&mut output, result);
                write_gotchas(&mut output, result);
                write_admin_roles(&mut output, result);
            }
            Source::Session(report) => {
                let _ = writeln!(output, "# Governance Escape Room Results\n");
                write_session_summary(&mut output, report);
                write_session_scenarios(&mut output, report);
            }
        }

        output
    }

    /// Writes the report footer.
    fn write_footer(output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&Utc::now());
        let _ = writeln!(output, "*Generated by Governance Escape Room at {timestamp}*");
    }
}

// ============================================================================
// Grading sections
// ============================================================================

fn write_score(output: &mut String, result: &GradingResult) {
    let b = &result.breakdown;

    let _ = writeln!(output, "## Score\n");
    let _ = writeln!(output, "**{}/100 ({})** {}\n", result.score, result.grade, result.grade.verdict());
    let _ = writeln!(output, "| Component | Points | Selected |");
    let _ = writeln!(output, "|-----------|--------|----------|");
    let _ = writeln!(
        output,
        "| Required | {}/{} | {} of {} |",
        b.required_coverage, b.required_max_points, b.required_selected, b.required_total
    );
    let _ = writeln!(
        output,
        "| Recommended | {}/{} | {} of {} |",
        b.recommended_coverage, b.recommended_max_points, b.recommended_selected, b.recommended_total
    );
    let _ = writeln!(
        output,
        "| Anti-patterns | {} | {} |",
        b.anti_pattern_penalty, b.anti_pattern_selected
    );
    let _ = writeln!(output);
}

fn write_picks(output: &mut String, heading: &str, picks: &[ControlFeedback]) {
    let _ = writeln!(output, "## {heading}\n");

    if picks.is_empty() {
        let _ = writeln!(output, "*None.*\n");
        return;
    }

    for pick in picks {
        let _ = writeln!(
            output,
            "- **{}** (`{}`): {}",
            escape_markdown(&pick.control_name),
            pick.control_id,
            escape_markdown(&pick.rationale)
        );
    }
    let _ = writeln!(output);
}

fn write_improved_approach(output: &mut String, result: &GradingResult) {
    let _ = writeln!(output, "## Improved Approach\n");
    let _ = writeln!(output, "{}\n", result.improved_approach.trim());
}

fn write_gotchas(output: &mut String, result: &GradingResult) {
    let _ = writeln!(output, "## Gotchas\n");

    if result.gotchas.is_empty() {
        let _ = writeln!(output, "*None.*\n");
        return;
    }

    for gotcha in &result.gotchas {
        let _ = writeln!(output, "- {}", escape_markdown(gotcha));
    }
    let _ = writeln!(output);
}

fn write_admin_roles(output: &mut String, result: &GradingResult) {
    let _ = writeln!(output, "## Admin Roles\n");

    if result.admin_roles.is_empty() {
        let _ = writeln!(output, "*No admin roles for the selected controls.*\n");
    } else {
        let _ = writeln!(output, "| Control | Roles |");
        let _ = writeln!(output, "|---------|-------|");
        for mapping in &result.admin_roles {
            let _ = writeln!(
                output,
                "| {} | {} |",
                escape_markdown(&mapping.control_name),
                escape_markdown(&mapping.required_role_names.join(", "))
            );
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "> {}\n", result.admin_role_disclaimer);
}

// ============================================================================
// Session sections
// ============================================================================

fn write_session_summary(output: &mut String, report: &SessionReport) {
    let _ = writeln!(output, "## Summary\n");
    let _ = writeln!(output, "| Metric | Value |");
    let _ = writeln!(output, "|--------|-------|");
    let _ = writeln!(
        output,
        "| Scenarios | {}/{} |",
        report.scenarios_completed, report.total_scenarios
    );
    let _ = writeln!(output, "| Average Score | {}/100 |", report.average_score);
    let _ = writeln!(output, "| Overall Grade | {} |", report.overall_grade);
    let _ = writeln!(output, "| Hints Used | {} |", report.total_hints_used);
    if let Some(seconds) = report.duration_seconds {
        let _ = writeln!(output, "| Duration | {} |", format_duration(seconds));
    }
    let _ = writeln!(output);
}

fn write_session_scenarios(output: &mut String, report: &SessionReport) {
    let _ = writeln!(output, "## Scenarios\n");
    let _ = writeln!(output, "| # | Scenario | Score | Grade | Hints | Missed |");
    let _ = writeln!(output, "|---|----------|-------|-------|-------|--------|");
    for (i, s) in report.scenarios.iter().enumerate() {
        let _ = writeln!(
            output,
            "| {} | {} {} | {} | {} | {} | {} |",
            i + 1,
            s.icon,
            escape_markdown(&s.title),
            s.score,
            s.grade,
            s.hints_used,
            s.missed_count
        );
    }
    let _ = writeln!(output);
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a duration in seconds, e.g. 65 -> "1m 5s", 3661 -> "1h 1m 1s".
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();

    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes characters that would break emphasis or table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '[' | ']' | '\\' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use escape_room_engine::{grade_submission, ContentStore, ADMIN_ROLE_DISCLAIMER};

    use super::*;
    use crate::test_support::finished_session;

    fn partial_result() -> GradingResult {
        let content = ContentStore::builtin().unwrap();
        grade_submission(
            &content,
            "scenario-1-leaky-sharepoint",
            &["least-privilege-access", "audit-logging", "mfa-enforcement"],
        )
        .unwrap()
    }

    #[test]
    fn test_result_report_structure() {
        let result = partial_result();
        let markdown = MarkdownGenerator::for_result("The Leaky SharePoint", &result).generate_body();

        assert!(markdown.starts_with("# The Leaky SharePoint\n"));
        assert!(markdown.contains("## Score\n"));
        assert!(markdown.contains(&format!("**{}/100 ({})**", result.score, result.grade)));
        assert!(markdown.contains("| Component | Points | Selected |"));
        assert!(markdown.contains("| Required | 23/70 | 1 of 3 |"));
        assert!(markdown.contains("| Recommended | 15/30 | 1 of 2 |"));
        assert!(markdown.contains("| Anti-patterns | -4 | 1 |"));

        assert!(markdown.contains("## Correct Picks\n"));
        assert!(markdown.contains("(`least-privilege-access`)"));
        assert!(markdown.contains("## Missed Picks\n"));
        assert!(markdown.contains("(`sharepoint-permissions-audit`)"));
        assert!(markdown.contains("## Unnecessary Picks\n"));
        assert!(markdown.contains("(`mfa-enforcement`)"));

        assert!(markdown.contains("## Improved Approach\n"));
        assert!(markdown.contains("## Gotchas\n"));
        assert!(markdown.contains("## Admin Roles\n"));
        assert!(markdown.contains(ADMIN_ROLE_DISCLAIMER));
        assert!(!markdown.contains("Generated by"));
    }

    #[test]
    fn test_empty_sections_show_placeholder() {
        let content = ContentStore::builtin().unwrap();
        let none: [&str; 0] = [];
        let result = grade_submission(&content, "scenario-2-label-lockdown", &none).unwrap();
        let markdown = MarkdownGenerator::for_result("Label Lockdown", &result).generate_body();

        assert!(markdown.contains("## Correct Picks\n\n*None.*"));
        assert!(markdown.contains("## Unnecessary Picks\n\n*None.*"));
        assert!(markdown.contains("*No admin roles for the selected controls.*"));
    }

    #[test]
    fn test_session_report_structure() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let markdown = MarkdownGenerator::for_session(&report).generate_body();

        assert!(markdown.starts_with("# Governance Escape Room Results\n"));
        assert!(markdown.contains("| Scenarios | 2/2 |"));
        assert!(markdown.contains(&format!("| Average Score | {}/100 |", report.average_score)));
        assert!(markdown.contains(&format!("| Overall Grade | {} |", report.overall_grade)));
        assert!(markdown.contains("| Hints Used | 1 |"));
        assert!(markdown.contains("| Duration | 6m 5s |"));
        assert!(markdown.contains("| 1 | 📁 The Leaky SharePoint Library | 100 | A | 1 | 0 |"));
    }

    #[test]
    fn test_generate_contains_footer() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let markdown = MarkdownGenerator::for_session(&report).generate();
        assert!(markdown.contains("---\n*Generated by Governance Escape Room at "));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(65), "1m 5s");
        assert_eq!(format_duration(3661), "1h 1m 1s");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a|b"), "a\\|b");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("line1\nline2"), "line1<br>line2");
        assert_eq!(escape_markdown("Copilot (M365)"), "Copilot (M365)");
    }
}
