//! Output comparison and verification.

use serde::{Deserialize, Serialize};

use crate::diff;

/// Result of verifying a single fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Fixture name (input file without `.in`).
    pub fixture: String,
    /// Input file name as passed to the tool.
    pub input: String,
    /// Whether the tool output matched the golden file byte for byte.
    pub passed: bool,
    /// Golden content before this run (lossy UTF-8).
    pub expected: String,
    /// Tool output (lossy UTF-8).
    pub actual: String,
    /// Diff if the fixture failed.
    pub diff: Option<String>,
    /// Whether the golden file was rewritten with `actual`.
    pub baseline_updated: bool,
    /// Tool exit code, `None` if killed by a signal.
    pub exit_code: Option<i32>,
}

impl VerificationResult {
    /// Compare `actual` against `golden` for one fixture.
    #[must_use]
    pub fn compare(
        fixture: &str,
        input: &str,
        golden: &[u8],
        actual: &[u8],
        exit_code: Option<i32>,
    ) -> Self {
        let passed = golden == actual;
        Self {
            fixture: fixture.to_string(),
            input: input.to_string(),
            passed,
            expected: String::from_utf8_lossy(golden).into_owned(),
            actual: String::from_utf8_lossy(actual).into_owned(),
            diff: (!passed).then(|| diff::render_diff(golden, actual)),
            baseline_updated: false,
            exit_code,
        }
    }

    /// Console line for this fixture.
    #[must_use]
    pub fn status_line(&self) -> String {
        let status = if self.passed { "passed" } else { "failed" };
        format!("Test \"{}\" {status}", self.input)
    }
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Golden files rewritten during the run.
    pub updated: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let updated = results.iter().filter(|r| r.baseline_updated).count();
        Self {
            total,
            passed,
            failed: total - passed,
            updated,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_output_passes() {
        let result = VerificationResult::compare("a", "a.in", b"42", b"42", Some(0));
        assert!(result.passed);
        assert!(result.diff.is_none());
        assert_eq!(result.status_line(), "Test \"a.in\" passed");
    }

    #[test]
    fn different_output_fails_with_diff() {
        let result = VerificationResult::compare("b", "b.in", b"1", b"2", Some(0));
        assert!(!result.passed);
        assert_eq!(result.status_line(), "Test \"b.in\" failed");
        let diff = result.diff.unwrap();
        assert!(diff.contains("-1\n+2\n"), "{diff}");
    }

    #[test]
    fn comparison_is_byte_exact() {
        let result = VerificationResult::compare("c", "c.in", b"x\r\n", b"x\n", Some(0));
        assert!(!result.passed);
    }

    #[test]
    fn summary_counts() {
        let mut failed = VerificationResult::compare("b", "b.in", b"1", b"2", Some(0));
        failed.baseline_updated = true;
        let summary = VerificationSummary::from_results(vec![
            VerificationResult::compare("a", "a.in", b"", b"", Some(0)),
            failed,
        ]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 1);
        assert!(!summary.all_passed());
        assert!(VerificationSummary::default().all_passed());
    }
}
