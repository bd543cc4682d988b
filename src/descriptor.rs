//! Per-directory pass configuration loading.
//!
//! Each pass lives in its own directory with a `config.toml` (preferred) or
//! `config.json`. Both formats are funneled into a `serde_json::Value` table
//! so field extraction and error reporting share one path. The loader only
//! builds descriptors; filtering and dependency cross-referencing live in
//! [`crate::resolve`].

use crate::diagnostics::Diagnostics;
use crate::features::FeatureTable;
use crate::version::{VersionError, VersionSpec};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TOML_CONFIG: &str = "config.toml";
pub const JSON_CONFIG: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {TOML_CONFIG} or {JSON_CONFIG} in {}", .0.display())]
    NotFound(PathBuf),
    #[error("unable to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("missing required field \"{field}\" in {}", .path.display())]
    MissingField {
        field: &'static str,
        path: PathBuf,
    },
    #[error("field \"{field}\" in {} must be {expected}", .path.display())]
    WrongType {
        field: String,
        path: PathBuf,
        expected: &'static str,
    },
    #[error("field \"{field}\" in {}: {source}", .path.display())]
    Version {
        field: String,
        path: PathBuf,
        #[source]
        source: VersionError,
    },
}

/// A named reference to another pass plus the version it must satisfy.
#[derive(Clone, Debug)]
pub struct DependencySpec {
    pub target: String,
    pub required_version: VersionSpec,
}

/// One discovered pass, immutable after loading.
///
/// `enabled` is computed once against the feature table handed to the
/// loader; it is never re-evaluated. Dependency entries stay as name/version
/// specs here; resolution produces a separate resolved structure rather than
/// rewriting this one.
#[derive(Debug)]
pub struct PassDescriptor {
    pub name: String,
    pub directory: PathBuf,
    /// Toolchain version this pass requires; all-wildcard when unspecified.
    pub toolchain_version: VersionSpec,
    /// The pass's own version, matched against dependents' requirements.
    pub version: VersionSpec,
    pub enablement_key: String,
    pub enabled: bool,
    pub dependencies: Vec<DependencySpec>,
}

#[derive(Deserialize)]
struct DependencyConfig {
    #[serde(default)]
    version: Option<Value>,
}

/// Load the pass configured in `directory`.
///
/// Recognized fields: `name` (defaults to the directory's base name),
/// `version`, `llvm` (the required toolchain version), `kconfig` (required
/// enablement key), and `depends` (a table of name to `{ version }`
/// entries; an explicit null is an empty table).
pub fn load_descriptor(
    directory: &Path,
    features: &FeatureTable,
    diag: &Diagnostics,
) -> Result<PassDescriptor, ConfigError> {
    let (path, table) = read_config_table(directory)?;

    let name = match table.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(_) => {
            return Err(ConfigError::WrongType {
                field: "name".to_string(),
                path,
                expected: "a string",
            });
        }
        None => directory
            .file_name()
            .map(|base| base.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let toolchain_version = parse_version_field(&table, "llvm", &path)?;
    let version = parse_version_field(&table, "version", &path)?;

    let enablement_key = match table.get("kconfig") {
        Some(Value::String(key)) => key.trim().to_string(),
        Some(_) => {
            return Err(ConfigError::WrongType {
                field: "kconfig".to_string(),
                path,
                expected: "a string",
            });
        }
        None => {
            return Err(ConfigError::MissingField {
                field: "kconfig",
                path,
            });
        }
    };
    let enabled = features.is_defined(&enablement_key);

    let dependencies = parse_dependencies(&table, &path)?;

    diag.note(format!(
        "found pass \"{name}\", version = {version}, toolchain version = {toolchain_version}"
    ));

    Ok(PassDescriptor {
        name,
        directory: directory.to_path_buf(),
        toolchain_version,
        version,
        enablement_key,
        enabled,
        dependencies,
    })
}

fn read_config_table(directory: &Path) -> Result<(PathBuf, Map<String, Value>), ConfigError> {
    let toml_path = directory.join(TOML_CONFIG);
    let json_path = directory.join(JSON_CONFIG);

    let (path, value) = if toml_path.is_file() {
        let text = read_file(&toml_path)?;
        let value: Value = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: toml_path.clone(),
            message: err.to_string(),
        })?;
        (toml_path, value)
    } else if json_path.is_file() {
        let text = read_file(&json_path)?;
        let value: Value = serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
            path: json_path.clone(),
            message: err.to_string(),
        })?;
        (json_path, value)
    } else {
        return Err(ConfigError::NotFound(directory.to_path_buf()));
    };

    match value {
        Value::Object(table) => Ok((path, table)),
        _ => Err(ConfigError::Parse {
            path,
            message: "top-level value must be a table".to_string(),
        }),
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_version_field(
    table: &Map<String, Value>,
    field: &str,
    path: &Path,
) -> Result<VersionSpec, ConfigError> {
    VersionSpec::parse(table.get(field)).map_err(|source| ConfigError::Version {
        field: field.to_string(),
        path: path.to_path_buf(),
        source,
    })
}

fn parse_dependencies(
    table: &Map<String, Value>,
    path: &Path,
) -> Result<Vec<DependencySpec>, ConfigError> {
    let entries = match table.get("depends") {
        // Absent or explicitly null both mean "no dependencies."
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(ConfigError::WrongType {
                field: "depends".to_string(),
                path: path.to_path_buf(),
                expected: "a table",
            });
        }
    };

    let mut dependencies = Vec::with_capacity(entries.len());
    for (target, entry) in entries {
        let config: DependencyConfig =
            serde_json::from_value(entry.clone()).map_err(|_| ConfigError::WrongType {
                field: format!("depends.{target}"),
                path: path.to_path_buf(),
                expected: "a table",
            })?;
        let required_version =
            VersionSpec::parse(config.version.as_ref()).map_err(|source| ConfigError::Version {
                field: format!("depends.{target}.version"),
                path: path.to_path_buf(),
                source,
            })?;
        dependencies.push(DependencySpec {
            target: target.clone(),
            required_version,
        });
    }
    Ok(dependencies)
}
