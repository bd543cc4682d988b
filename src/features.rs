//! Kconfig-style feature table.
//!
//! The table is a read-only snapshot of a line-oriented `KEY=VALUE` config
//! file. Lines that are not a single `=`-delimited pair are skipped rather
//! than rejected: the source format carries unrelated directives and partial
//! comments that this tool has no business validating.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Immutable mapping of normalized feature keys to their raw values.
///
/// "Defined with an empty value" and "not defined at all" are distinct
/// states; enablement checks only care about the former.
#[derive(Clone, Debug, Default)]
pub struct FeatureTable {
    entries: BTreeMap<String, String>,
}

impl FeatureTable {
    /// Parse a feature table from config-file text.
    ///
    /// `#` starts a trailing comment. Keys are trimmed and `prefix` is
    /// stripped when present, so `CONFIG_FOO=y` and `FOO=y` define the same
    /// feature. Malformed lines are silently skipped.
    pub fn parse(source: &str, prefix: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in source.lines() {
            let uncommented = line.split('#').next().unwrap_or("").trim();
            let parts: Vec<&str> = uncommented.split('=').collect();
            let [key, value] = parts.as_slice() else {
                continue;
            };
            let key = key.trim();
            let key = key.strip_prefix(prefix).unwrap_or(key);
            entries.insert(key.to_string(), value.trim().to_string());
        }
        FeatureTable { entries }
    }

    /// Read and parse a feature table from disk.
    pub fn load(path: &Path, prefix: &str) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Ok(Self::parse(&source, prefix))
    }

    /// Whether `key` appears in the table, even with an empty value.
    pub fn is_defined(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate entries in sorted key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
