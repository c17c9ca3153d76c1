//! Report generation for fixture runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::verify::VerificationSummary;

/// A golden file overwritten during an update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenGolden {
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
}

impl RewrittenGolden {
    #[must_use]
    pub fn new(path: &Path, content: &[u8]) -> Self {
        Self {
            path: path.display().to_string(),
            sha256: sha256_hex(content),
            size_bytes: content.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub title: String,
    /// Tool command line, without the per-fixture arguments.
    pub tool: String,
    /// Tool mode (`lex`, `syntax`, `types`).
    pub mode: String,
    /// Baseline policy (`verify`, `update`).
    pub policy: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub summary: VerificationSummary,
    pub rewritten: Vec<RewrittenGolden>,
}

impl RunReport {
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Tool: `{}`\n", self.tool));
        out.push_str(&format!("- Mode: {}\n", self.mode));
        out.push_str(&format!("- Policy: {}\n", self.policy));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!("- Failed: {}\n", self.summary.failed));
        out.push_str(&format!("- Updated: {}\n\n", self.summary.updated));

        out.push_str("| Fixture | Status | Baseline |\n");
        out.push_str("|---------|--------|----------|\n");
        for r in &self.summary.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            let baseline = if r.baseline_updated { "rewritten" } else { "-" };
            out.push_str(&format!("| {} | {status} | {baseline} |\n", r.input));
        }

        if !self.rewritten.is_empty() {
            out.push_str("\n## Rewritten golden files\n\n");
            for g in &self.rewritten {
                out.push_str(&format!(
                    "- `{}` ({} bytes, sha256 `{}`)\n",
                    g.path, g.size_bytes, g.sha256
                ));
            }
        }

        let failures: Vec<_> = self
            .summary
            .results
            .iter()
            .filter_map(|r| r.diff.as_ref().map(|d| (r, d)))
            .collect();
        if !failures.is_empty() {
            out.push_str("\n## Diffs\n");
            for (r, diff) in failures {
                out.push_str(&format!("\n### {}\n\n```diff\n{diff}```\n", r.input));
            }
        }
        out
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex_lower(&sha2::Sha256::digest(data))
}
