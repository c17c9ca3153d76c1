//! Test execution engine.
//!
//! Fixtures run strictly one after another: with the default capture every
//! invocation writes the same shared file, so two overlapping runs would read
//! each other's output.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::{BaselinePolicy, ExitPolicy, HarnessConfig};
use crate::error::HarnessError;
use crate::fixtures::{Fixture, FixtureSet};
use crate::report::RewrittenGolden;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::verify::{VerificationResult, VerificationSummary};

/// Everything a completed batch produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: VerificationSummary,
    pub rewritten: Vec<RewrittenGolden>,
}

/// Runs a fixture set against the configured tool.
pub struct TestRunner {
    pub config: HarnessConfig,
}

impl TestRunner {
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run every fixture in `set`, printing one status line per fixture to
    /// `console`, then remove the shared output file.
    ///
    /// The first fatal error aborts the batch; lines already printed stay
    /// printed and no cleanup happens.
    pub fn run<W: Write>(
        &self,
        set: &FixtureSet,
        console: &mut W,
        log: &mut LogEmitter,
    ) -> Result<RunOutcome, HarnessError> {
        let entry = log
            .entry(LogLevel::Info, "run_start")
            .with_mode(self.config.mode.as_str())
            .with_policy(self.config.policy.as_str())
            .with_details(serde_json::json!({
                "fixture_dir": set.dir.display().to_string(),
                "fixtures": set.len(),
                "tool": self.config.tool.display(),
            }));
        emit(log, entry)?;

        match self.run_batch(set, console, log) {
            Ok(outcome) => {
                let entry = log
                    .entry(LogLevel::Info, "run_end")
                    .with_details(serde_json::json!({
                        "total": outcome.summary.total,
                        "passed": outcome.summary.passed,
                        "failed": outcome.summary.failed,
                        "updated": outcome.summary.updated,
                    }));
                emit(log, entry)?;
                log.flush().map_err(|e| HarnessError::io("<log>", e))?;
                Ok(outcome)
            }
            Err(err) => {
                let entry = log
                    .entry(LogLevel::Error, "run_aborted")
                    .with_outcome(Outcome::Error)
                    .with_details(serde_json::json!({ "error": err.to_string() }));
                // Best effort; `err` is returned either way.
                let _ = emit(log, entry);
                let _ = log.flush();
                Err(err)
            }
        }
    }

    fn run_batch<W: Write>(
        &self,
        set: &FixtureSet,
        console: &mut W,
        log: &mut LogEmitter,
    ) -> Result<RunOutcome, HarnessError> {
        let mut results = Vec::with_capacity(set.len());
        let mut rewritten = Vec::new();

        for fixture in &set.fixtures {
            let mut result = self.run_fixture(&set.dir, fixture, log)?;

            writeln!(console, "{}", result.verification.status_line())
                .map_err(|e| HarnessError::io("<console>", e))?;

            if !result.verification.passed && self.config.policy == BaselinePolicy::Update {
                let golden_path = fixture.golden_path(&set.dir);
                let actual = result.actual_bytes.take().unwrap_or_default();
                std::fs::write(&golden_path, &actual)
                    .map_err(|e| HarnessError::io(&golden_path, e))?;
                result.verification.baseline_updated = true;

                let entry = log
                    .entry(LogLevel::Info, "baseline_updated")
                    .with_fixture(&fixture.name)
                    .with_artifacts(vec![golden_path.display().to_string()]);
                emit(log, entry)?;
                rewritten.push(RewrittenGolden::new(&golden_path, &actual));
            }

            let verification = result.verification;
            let entry = log
                .entry(
                    if verification.passed {
                        LogLevel::Info
                    } else {
                        LogLevel::Warn
                    },
                    "fixture_result",
                )
                .with_fixture(&fixture.name)
                .with_outcome(if verification.passed {
                    Outcome::Pass
                } else {
                    Outcome::Fail
                })
                .with_exit_code(verification.exit_code)
                .with_duration_ms(result.duration_ms);
            emit(log, entry)?;

            results.push(verification);
        }

        self.cleanup(&set.dir, log)?;

        Ok(RunOutcome {
            summary: VerificationSummary::from_results(results),
            rewritten,
        })
    }

    fn run_fixture(
        &self,
        dir: &Path,
        fixture: &Fixture,
        log: &mut LogEmitter,
    ) -> Result<FixtureRun, HarnessError> {
        let input = fixture.input_name();
        let capture = self.config.capture();

        let entry = log
            .entry(LogLevel::Debug, "fixture_start")
            .with_fixture(&fixture.name);
        emit(log, entry)?;

        let run = self.config.tool.run(self.config.mode, &input, dir, &capture)?;
        if !run.success && self.config.exit_policy == ExitPolicy::Fail {
            return Err(HarnessError::ToolExit {
                fixture: input,
                code: run.exit_code,
            });
        }

        let actual = capture.read(dir, &run)?;
        let golden = read_golden(&fixture.golden_path(dir))?;
        let verification =
            VerificationResult::compare(&fixture.name, &input, &golden, &actual, run.exit_code);

        Ok(FixtureRun {
            verification,
            actual_bytes: Some(actual),
            duration_ms: u64::try_from(run.duration.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Remove the shared output file once the whole batch is done.
    ///
    /// Fails when the file was never created, including for an empty batch.
    fn cleanup(&self, dir: &Path, log: &mut LogEmitter) -> Result<(), HarnessError> {
        let Some(path) = self.config.capture().shared_path(dir) else {
            return Ok(());
        };
        std::fs::remove_file(&path).map_err(|source| HarnessError::Cleanup {
            path: path.clone(),
            source,
        })?;
        let entry = log
            .entry(LogLevel::Debug, "cleanup")
            .with_artifacts(vec![path.display().to_string()]);
        emit(log, entry)
    }
}

struct FixtureRun {
    verification: VerificationResult,
    actual_bytes: Option<Vec<u8>>,
    duration_ms: u64,
}

fn read_golden(path: &Path) -> Result<Vec<u8>, HarnessError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            HarnessError::GoldenMissing {
                path: PathBuf::from(path),
            }
        } else {
            HarnessError::io(path, source)
        }
    })
}

fn emit(log: &mut LogEmitter, entry: LogEntry) -> Result<(), HarnessError> {
    log.emit_entry(entry).map_err(|e| HarnessError::io("<log>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldfix_exec::ToolCommand;

    fn scratch_dir(prefix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time should be after UNIX_EPOCH")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    // Echoes the input file into output.txt, the way the compiler writes its listing.
    fn echo_tool() -> ToolCommand {
        ToolCommand::new(
            "sh",
            vec![String::from("-c"), String::from("cat \"$1\" > output.txt")],
        )
    }

    fn config_for(dir: &Path, policy: BaselinePolicy) -> HarnessConfig {
        HarnessConfig {
            fixture_dir: dir.to_path_buf(),
            tool: echo_tool(),
            policy,
            ..HarnessConfig::default()
        }
    }

    fn run(config: HarnessConfig) -> (Result<RunOutcome, HarnessError>, String) {
        let set = FixtureSet::discover(&config.fixture_dir).unwrap();
        let mut console = Vec::new();
        let mut log = LogEmitter::to_buffer("goldfix", "unit");
        let result = TestRunner::new(config).run(&set, &mut console, &mut log);
        (result, String::from_utf8(console).unwrap())
    }

    #[test]
    fn matching_fixture_passes_and_golden_is_untouched() {
        let dir = scratch_dir("goldfix-runner-pass");
        std::fs::write(dir.join("a.in"), "42").unwrap();
        std::fs::write(dir.join("a.out"), "42").unwrap();

        let (result, console) = run(config_for(&dir, BaselinePolicy::Update));
        let outcome = result.unwrap();
        assert_eq!(console, "Test \"a.in\" passed\n");
        assert!(outcome.summary.all_passed());
        assert!(outcome.rewritten.is_empty());
        assert_eq!(std::fs::read_to_string(dir.join("a.out")).unwrap(), "42");
        assert!(!dir.join("output.txt").exists());
    }

    #[test]
    fn mismatch_in_update_mode_rewrites_golden() {
        let dir = scratch_dir("goldfix-runner-update");
        std::fs::write(dir.join("b.in"), "2").unwrap();
        std::fs::write(dir.join("b.out"), "1").unwrap();

        let (result, console) = run(config_for(&dir, BaselinePolicy::Update));
        let outcome = result.unwrap();
        assert_eq!(console, "Test \"b.in\" failed\n");
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.updated, 1);
        assert_eq!(outcome.rewritten.len(), 1);
        assert_eq!(std::fs::read_to_string(dir.join("b.out")).unwrap(), "2");

        let (second, console) = run(config_for(&dir, BaselinePolicy::Update));
        assert!(second.unwrap().summary.all_passed());
        assert_eq!(console, "Test \"b.in\" passed\n");
    }

    #[test]
    fn mismatch_in_verify_mode_leaves_golden() {
        let dir = scratch_dir("goldfix-runner-verify");
        std::fs::write(dir.join("b.in"), "2").unwrap();
        std::fs::write(dir.join("b.out"), "1").unwrap();

        let (result, console) = run(config_for(&dir, BaselinePolicy::Verify));
        let outcome = result.unwrap();
        assert_eq!(console, "Test \"b.in\" failed\n");
        assert_eq!(outcome.summary.updated, 0);
        assert!(!outcome.summary.results[0].baseline_updated);
        assert_eq!(std::fs::read_to_string(dir.join("b.out")).unwrap(), "1");
    }

    #[test]
    fn empty_batch_fails_cleanup() {
        let dir = scratch_dir("goldfix-runner-empty");
        let (result, console) = run(config_for(&dir, BaselinePolicy::Verify));
        assert!(console.is_empty());
        assert!(matches!(result, Err(HarnessError::Cleanup { .. })));
    }

    #[test]
    fn missing_golden_aborts_batch() {
        let dir = scratch_dir("goldfix-runner-no-golden");
        std::fs::write(dir.join("a.in"), "1").unwrap();
        std::fs::write(dir.join("a.out"), "1").unwrap();
        std::fs::write(dir.join("b.in"), "2").unwrap();
        std::fs::write(dir.join("c.in"), "3").unwrap();
        std::fs::write(dir.join("c.out"), "3").unwrap();

        let (result, console) = run(config_for(&dir, BaselinePolicy::Update));
        assert!(matches!(result, Err(HarnessError::GoldenMissing { .. })));
        assert_eq!(console, "Test \"a.in\" passed\n");
        assert!(!dir.join("b.out").exists());
        // Aborted runs skip cleanup.
        assert!(dir.join("output.txt").exists());
    }

    #[test]
    fn nonzero_exit_is_fatal_unless_ignored() {
        let dir = scratch_dir("goldfix-runner-exit");
        std::fs::write(dir.join("a.in"), "1").unwrap();
        std::fs::write(dir.join("a.out"), "1").unwrap();
        let failing = ToolCommand::new(
            "sh",
            vec![
                String::from("-c"),
                String::from("cat \"$1\" > output.txt; exit 1"),
            ],
        );

        let mut config = config_for(&dir, BaselinePolicy::Verify);
        config.tool = failing;
        let (result, _) = run(config.clone());
        assert!(matches!(
            result,
            Err(HarnessError::ToolExit { code: Some(1), .. })
        ));

        config.exit_policy = ExitPolicy::Ignore;
        let (result, console) = run(config);
        assert!(result.unwrap().summary.all_passed());
        assert_eq!(console, "Test \"a.in\" passed\n");
    }

    #[test]
    fn stdout_capture_needs_no_shared_file() {
        let dir = scratch_dir("goldfix-runner-stdout");
        std::fs::write(dir.join("a.in"), "42").unwrap();
        std::fs::write(dir.join("a.out"), "42").unwrap();

        let mut config = config_for(&dir, BaselinePolicy::Verify);
        config.tool = ToolCommand::new("sh", vec![String::from("-c"), String::from("cat \"$1\"")]);
        config.capture = crate::config::CaptureKind::Stdout;

        let (result, console) = run(config);
        assert!(result.unwrap().summary.all_passed());
        assert_eq!(console, "Test \"a.in\" passed\n");
        assert!(!dir.join("output.txt").exists());
    }

    #[test]
    fn stdout_capture_allows_empty_batch() {
        let dir = scratch_dir("goldfix-runner-stdout-empty");
        let mut config = config_for(&dir, BaselinePolicy::Verify);
        config.capture = crate::config::CaptureKind::Stdout;
        let (result, console) = run(config);
        assert_eq!(result.unwrap().summary.total, 0);
        assert!(console.is_empty());
    }
}
