use crate::scope::UrlScope;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TOP_N: usize = 10;

/// Settings for one analysis run.
///
/// Pairing window, default durations and all scoring thresholds are fixed;
/// only the report length and the host scope can be tuned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of entries in the slowest-requests list
    pub top_n: usize,
    /// Host patterns to keep (empty = all hosts)
    pub include_hosts: Vec<String>,
    /// Host patterns to drop
    pub exclude_hosts: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            include_hosts: vec![],
            exclude_hosts: vec![],
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading analysis config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_include_hosts(mut self, patterns: Vec<String>) -> Self {
        self.include_hosts.extend(patterns);
        self
    }

    pub fn with_exclude_hosts(mut self, patterns: Vec<String>) -> Self {
        self.exclude_hosts.extend(patterns);
        self
    }

    /// Compile the host patterns.
    pub fn scope(&self) -> Result<UrlScope> {
        UrlScope::new()
            .with_include(&self.include_hosts)?
            .with_exclude(&self.exclude_hosts)
    }
}
