//! Golden-file fixture runner for an external compiler artifact.
//!
//! This crate provides:
//! - Fixture discovery: `<name>.in` inputs paired with `<name>.out` golden files
//! - Fixture run: invoke the tool per fixture and compare output byte for byte
//! - Baseline maintenance: opt-in rewrite of golden files on mismatch
//! - Report generation: human-readable + machine-readable run reports
//! - Structured JSONL logs for every run

#![forbid(unsafe_code)]

pub mod config;
pub mod diff;
pub mod error;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use config::{BaselinePolicy, ExitPolicy, HarnessConfig};
pub use error::HarnessError;
pub use fixtures::{Fixture, FixtureSet};
pub use report::RunReport;
pub use runner::{RunOutcome, TestRunner};
pub use verify::VerificationResult;
