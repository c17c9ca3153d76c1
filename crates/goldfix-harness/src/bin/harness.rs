//! CLI entrypoint for the goldfix fixture runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use goldfix_exec::ToolMode;
use goldfix_harness::config::CaptureKind;
use goldfix_harness::structured_log::{LogEmitter, now_utc, validate_log_file};
use goldfix_harness::{BaselinePolicy, ExitPolicy, FixtureSet, HarnessConfig, RunReport, TestRunner};

/// Golden-file tooling for the external compiler.
#[derive(Debug, Parser)]
#[command(name = "goldfix-harness")]
#[command(about = "Run .in fixtures through an external compiler and diff against .out golden files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaptureArg {
    /// Read the shared file the tool writes (see --output-file).
    SharedFile,
    /// Read the tool's standard output.
    Stdout,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every fixture in a directory.
    Run {
        /// Directory containing <name>.in / <name>.out pairs.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// JSON config file; flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Executable to invoke (e.g. `java`).
        #[arg(long)]
        tool: Option<String>,
        /// Argument placed before the mode switch; repeatable.
        #[arg(long = "tool-arg", allow_hyphen_values = true)]
        tool_args: Vec<String>,
        /// Compiler listing to compare: lex (-l), syntax (-s) or types (-t).
        #[arg(long, value_parser = parse_mode, allow_hyphen_values = true)]
        mode: Option<ToolMode>,
        /// Where the tool's result is read from.
        #[arg(long, value_enum)]
        capture: Option<CaptureArg>,
        /// Shared output file written by the tool, relative to --dir.
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Overwrite golden files with the actual output on mismatch.
        #[arg(long)]
        update: bool,
        /// Treat a non-zero tool exit as a normal run.
        #[arg(long)]
        ignore_exit_status: bool,
        /// Print a diff to stderr for each failed fixture.
        #[arg(long)]
        show_diff: bool,
        /// Output report path (markdown; JSON is written next to it).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Validate a JSONL log written by `run --log`.
    ValidateLog {
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            dir,
            config,
            tool,
            tool_args,
            mode,
            capture,
            output_file,
            update,
            ignore_exit_status,
            show_diff,
            report,
            log,
        } => {
            let mut cfg = match &config {
                Some(path) => HarnessConfig::from_file(path)?,
                None => HarnessConfig::default(),
            };
            if let Some(dir) = dir {
                cfg.fixture_dir = dir;
            }
            if let Some(program) = tool {
                cfg.tool.program = program;
                cfg.tool.args = tool_args;
            } else if !tool_args.is_empty() {
                cfg.tool.args = tool_args;
            }
            if let Some(mode) = mode {
                cfg.mode = mode;
            }
            if let Some(capture) = capture {
                cfg.capture = match capture {
                    CaptureArg::SharedFile => CaptureKind::SharedFile,
                    CaptureArg::Stdout => CaptureKind::Stdout,
                };
            }
            if let Some(output_file) = output_file {
                cfg.output_file = output_file;
            }
            if update {
                cfg.policy = BaselinePolicy::Update;
            }
            if ignore_exit_status {
                cfg.exit_policy = ExitPolicy::Ignore;
            }

            let run_id = run_id();
            let mut emitter = match &log {
                Some(path) => LogEmitter::to_file(path, "goldfix", &run_id)?,
                None => LogEmitter::disabled(),
            };

            let set = FixtureSet::discover(&cfg.fixture_dir)?;
            let runner = TestRunner::new(cfg);
            let mut stdout = std::io::stdout().lock();
            let outcome = runner.run(&set, &mut stdout, &mut emitter)?;

            if show_diff {
                for result in &outcome.summary.results {
                    if let Some(diff) = &result.diff {
                        eprintln!("{}\n{diff}", result.input);
                    }
                }
            }

            eprintln!(
                "Run complete: total={}, passed={}, failed={}, updated={}",
                outcome.summary.total,
                outcome.summary.passed,
                outcome.summary.failed,
                outcome.summary.updated
            );

            let policy = runner.config.policy;
            let report_doc = RunReport {
                title: String::from("goldfix Fixture Report"),
                tool: runner.config.tool.display(),
                mode: runner.config.mode.as_str().to_string(),
                policy: policy.as_str().to_string(),
                timestamp: now_utc(),
                summary: outcome.summary,
                rewritten: outcome.rewritten,
            };

            if let Some(report_path) = report {
                eprintln!("Writing report to {}", report_path.display());
                std::fs::write(&report_path, report_doc.to_markdown())?;
                let json_path = report_path.with_extension("json");
                std::fs::write(&json_path, report_doc.to_json())?;
            }

            if policy == BaselinePolicy::Verify && !report_doc.summary.all_passed() {
                return Err("Fixture verification failed".into());
            }
        }
        Command::ValidateLog { path } => {
            let (lines, errors) = validate_log_file(&path)?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!("Validated {lines} log lines: {} errors", errors.len());
            if !errors.is_empty() {
                return Err(format!("Invalid log {}", path.display()).into());
            }
        }
    }

    Ok(())
}

fn parse_mode(raw: &str) -> Result<ToolMode, String> {
    ToolMode::from_str_loose(raw)
        .ok_or_else(|| format!("Unsupported mode '{raw}', expected lex|syntax|types"))
}

fn run_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("run-{nanos:x}")
}
