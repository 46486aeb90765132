//! Test data model
//!
//! A data root is a directory tree. Every directory is a group: its optional
//! `_context.yaml` holds the group configuration, every other `*.yaml`,
//! `*.yml` or `*.json` file is one case, and subdirectories are nested groups.

mod loader;

pub use loader::load;

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::roundtrip::RoundTrip;

/// File name holding a directory's group configuration (any supported extension)
pub const CONTEXT_FILE_STEM: &str = "_context";

/// Static per-directory configuration
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupConfig {
    /// Human-readable summary (defaults to the directory name)
    pub summary: String,
    /// Cleaner run after every leaf in this subtree finished
    pub cleaner: Option<String>,
    /// Template merged onto the inherited one
    pub round_trip_template: Option<RoundTrip>,
    /// Presetters applied while constructing the context
    pub presetters: Vec<PresetConfig>,
    /// Static variables, values may reference earlier bindings
    pub variables: BTreeMap<String, Value>,
    /// Setup round trips, run once per group activation
    pub flow: Vec<RoundTrip>,
}

/// A presetter invocation inside a group configuration
#[derive(Deserialize, Debug, Clone)]
pub struct PresetConfig {
    /// Registered presetter name
    pub name: String,
    /// Presetter-specific arguments
    #[serde(default)]
    pub args: Value,
}

/// One leaf test
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Case {
    /// What the case verifies
    pub description: String,
    /// Ordered steps
    pub flow: Vec<RoundTrip>,
}

/// A loaded case file
#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub case: Case,
}

/// A loaded directory
#[derive(Debug, Clone, Default)]
pub struct Dir {
    pub path: PathBuf,
    pub context: GroupConfig,
    /// Nested groups by directory name
    pub dirs: BTreeMap<String, Dir>,
    /// Cases by file name
    pub files: BTreeMap<String, File>,
    /// Leaves in the whole subtree
    pub case_num: usize,
}

impl Dir {
    /// Recompute `case_num` for this subtree
    pub fn count_cases(&mut self) -> usize {
        let nested: usize = self.dirs.values_mut().map(Dir::count_cases).sum();
        self.case_num = self.files.len() + nested;
        self.case_num
    }
}
