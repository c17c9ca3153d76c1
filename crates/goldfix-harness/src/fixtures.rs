//! Fixture discovery.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

pub const INPUT_SUFFIX: &str = ".in";
pub const GOLDEN_SUFFIX: &str = ".out";

/// One `<name>.in` / `<name>.out` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
}

impl Fixture {
    /// Recognise a fixture input by file name. The name before `.in` must be non-empty.
    #[must_use]
    pub fn from_input_name(file_name: &str) -> Option<Self> {
        let name = file_name.strip_suffix(INPUT_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
        })
    }

    /// Input file name, as passed to the tool.
    #[must_use]
    pub fn input_name(&self) -> String {
        format!("{}{INPUT_SUFFIX}", self.name)
    }

    #[must_use]
    pub fn golden_name(&self) -> String {
        format!("{}{GOLDEN_SUFFIX}", self.name)
    }

    #[must_use]
    pub fn golden_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.golden_name())
    }
}

/// All fixtures found in one directory, in file-name order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    pub dir: PathBuf,
    pub fixtures: Vec<Fixture>,
}

impl FixtureSet {
    /// Scan `dir` (non-recursively) for `.in` files.
    pub fn discover(dir: &Path) -> Result<Self, HarnessError> {
        let entries = std::fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;

        let mut fixtures = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(fixture) = entry.file_name().to_str().and_then(Fixture::from_input_name) {
                fixtures.push(fixture);
            }
        }
        fixtures.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            dir: dir.to_path_buf(),
            fixtures,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}
