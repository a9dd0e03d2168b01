//! JSON report generation.
//!
//! [`JsonGenerator`] serializes any report value (a [`SessionReport`] or a
//! single grading result) as compact single-line JSON or pretty-printed for
//! human readability.
//!
//! [`SessionReport`]: crate::SessionReport

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{ReportError, Result};

/// JSON report generator.
///
/// # Example
///
/// ```rust
/// use escape_room_engine::{grade_submission, ContentStore};
/// use escape_room_report::json::JsonGenerator;
///
/// let content = ContentStore::builtin().unwrap();
/// let result = grade_submission(&content, "scenario-1-leaky-sharepoint", &["audit-logging"]).unwrap();
///
/// let json = JsonGenerator::new(&result).generate_pretty().unwrap();
/// assert!(json.contains("\"recommendedCoverage\""));
/// ```
pub struct JsonGenerator<'a, T: Serialize + ?Sized> {
    report: &'a T,
}

impl<'a, T: Serialize + ?Sized> JsonGenerator<'a, T> {
    /// Creates a new JSON generator for the given value.
    #[must_use]
    pub const fn new(report: &'a T) -> Self {
        Self { report }
    }

    /// Generates compact JSON output (single line, no extra whitespace).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON output with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the JSON report to a file, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    /// Returns [`ReportError::Io`] if file creation or writing fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::test_support::finished_session;
    use crate::SessionReport;

    #[test]
    fn test_generate_compact() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let json = JsonGenerator::new(&report).generate().unwrap();

        assert!(!json.contains('\n'));
        assert!(json.contains("\"averageScore\""));
    }

    #[test]
    fn test_generate_pretty() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let json = JsonGenerator::new(&report).generate_pretty().unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  \"scenarios\""));
    }

    #[test]
    fn test_pretty_and_compact_parse_equal() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let generator = JsonGenerator::new(&report);

        let compact: serde_json::Value = serde_json::from_str(&generator.generate().unwrap()).unwrap();
        let pretty: serde_json::Value =
            serde_json::from_str(&generator.generate_pretty().unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }

    #[test]
    fn test_session_report_json_shape() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        insta::assert_json_snapshot!(report.scenarios[0], @r###"
        {
          "scenarioId": "scenario-1-leaky-sharepoint",
          "title": "The Leaky SharePoint Library",
          "icon": "📁",
          "score": 100,
          "grade": "A",
          "hintsUsed": 1,
          "correctCount": 5,
          "missedCount": 0,
          "unnecessaryCount": 0
        }
        "###);
    }

    #[test]
    fn test_write_to_file() {
        let report = SessionReport::from_state(&finished_session()).unwrap();
        let path = std::env::temp_dir().join("test_escape_room_report.json");

        JsonGenerator::new(&report).write_to_file(&path, true).unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let parsed: SessionReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, report);

        std::fs::remove_file(&path).ok();
    }
}
