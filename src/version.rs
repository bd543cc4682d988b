//! Partial version values with wildcard-tolerant matching.
//!
//! A `VersionSpec` is a semantic-version triple in which any position may be a
//! wildcard. Pass configs express versions as a bare number, a dotted string
//! like `"1.2.*"`, or a table with optional `major`/`minor`/`patch` fields;
//! all three forms (plus absence) funnel through [`VersionSpec::parse`].

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version string \"{0}\" must have 1 to 3 dot-separated components")]
    ComponentCount(String),
    #[error("version component \"{0}\" is not an integer or \"*\"")]
    BadComponent(String),
    #[error("version value must be a string, an integer, or a table with major/minor/patch fields")]
    UnsupportedShape,
}

/// A version with optional fields; `None` means "matches anything here."
///
/// Derived equality is structural (two specs with identical fields). The
/// compatibility relation used everywhere else is [`VersionSpec::matches`],
/// which treats wildcards as matching any value. `matches` is symmetric but
/// not transitive, so it must never be used as a sort or dedup key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionSpec {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
}

/// The shapes a version may take in a pass config.
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionSource {
    Number(u64),
    Text(String),
    Record {
        #[serde(default)]
        major: Option<FieldSource>,
        #[serde(default)]
        minor: Option<FieldSource>,
        #[serde(default)]
        patch: Option<FieldSource>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSource {
    Int(u64),
    Token(String),
}

impl VersionSpec {
    pub const WILDCARD: VersionSpec = VersionSpec {
        major: None,
        minor: None,
        patch: None,
    };

    /// Build a spec from an optional config value.
    ///
    /// Absent and explicit-null values mean all-wildcard. A bare number is
    /// coerced to the major field. Strings follow the dotted grammar, and
    /// tables may name any subset of `major`/`minor`/`patch` with either an
    /// integer or `"*"`; omitted fields are wildcards.
    pub fn parse(value: Option<&Value>) -> Result<Self, VersionError> {
        let Some(value) = value else {
            return Ok(Self::WILDCARD);
        };
        if value.is_null() {
            return Ok(Self::WILDCARD);
        }

        let source: VersionSource =
            serde_json::from_value(value.clone()).map_err(|_| VersionError::UnsupportedShape)?;

        match source {
            VersionSource::Number(major) => Ok(VersionSpec {
                major: Some(major),
                minor: None,
                patch: None,
            }),
            VersionSource::Text(text) => text.parse(),
            VersionSource::Record {
                major,
                minor,
                patch,
            } => Ok(VersionSpec {
                major: parse_field(major)?,
                minor: parse_field(minor)?,
                patch: parse_field(patch)?,
            }),
        }
    }

    /// Wildcard-tolerant compatibility check.
    ///
    /// Each position matches when either side is a wildcard or both integers
    /// are equal; the specs match when all three positions do.
    pub fn matches(&self, other: &VersionSpec) -> bool {
        field_matches(self.major, other.major)
            && field_matches(self.minor, other.minor)
            && field_matches(self.patch, other.patch)
    }
}

fn field_matches(a: Option<u64>, b: Option<u64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

fn parse_field(source: Option<FieldSource>) -> Result<Option<u64>, VersionError> {
    match source {
        None => Ok(None),
        Some(FieldSource::Int(value)) => Ok(Some(value)),
        Some(FieldSource::Token(token)) if token == "*" => Ok(None),
        Some(FieldSource::Token(token)) => Err(VersionError::BadComponent(token)),
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(text: &str) -> Result<Self, VersionError> {
        let components: Vec<&str> = text.split('.').collect();
        if text.trim().is_empty() || components.len() > 3 {
            return Err(VersionError::ComponentCount(text.to_string()));
        }

        let mut fields = [None, None, None];
        for (slot, component) in fields.iter_mut().zip(&components) {
            if *component == "*" {
                continue;
            }
            let value: u64 = component
                .parse()
                .map_err(|_| VersionError::BadComponent(component.to_string()))?;
            *slot = Some(value);
        }

        let [major, minor, patch] = fields;
        Ok(VersionSpec {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for VersionSpec {
    /// Trailing wildcards are elided; an interior wildcard renders as `*` so
    /// a concrete patch keeps its position.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.major {
            Some(major) => write!(f, "{major}")?,
            None => write!(f, "*")?,
        }
        match (self.minor, self.patch) {
            (Some(minor), _) => write!(f, ".{minor}")?,
            (None, Some(_)) => write!(f, ".*")?,
            (None, None) => {}
        }
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}
