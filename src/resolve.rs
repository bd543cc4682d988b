//! Pass discovery, filtering, and dependency resolution.
//!
//! The engine runs one resolution per invocation: discover every pass under
//! the passes root, drop disabled passes, drop toolchain-incompatible
//! passes, verify no enabled pass was lost, then cross-reference each
//! survivor's dependency specs against the survivor set. Stages are
//! fail-fast between each other but gather every failure within a stage so
//! operators see the whole picture before the abort.

use crate::descriptor::{PassDescriptor, load_descriptor};
use crate::diagnostics::Diagnostics;
use crate::features::FeatureTable;
use crate::version::VersionSpec;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Why a pass was excluded by the filter pipeline.
///
/// Recorded per excluded pass and replayed later when a dependency points at
/// an excluded pass, so "missing" failures explain themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterReason {
    Disabled,
    IncompatibleToolchain,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::Disabled => "pass was disabled via build configuration",
            FilterReason::IncompatibleToolchain => "pass has an incompatible toolchain version",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every attributed failure gathered within one resolution stage.
#[derive(Debug, Default)]
pub struct FailureReport {
    pub failures: Vec<String>,
}

impl FailureReport {
    fn push(&mut self, failure: String) {
        self.failures.push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "{report}cannot apply passes because {} enabled pass(es) were filtered out",
        .report.len()
    )]
    EnablementIncomplete { report: FailureReport },
    #[error(
        "{report}failed to resolve pass dependencies: {} failure(s)",
        .report.len()
    )]
    Dependency { report: FailureReport },
}

impl ResolveError {
    pub fn report(&self) -> &FailureReport {
        match self {
            ResolveError::EnablementIncomplete { report } => report,
            ResolveError::Dependency { report } => report,
        }
    }
}

/// A surviving pass with its dependencies resolved to shared descriptors.
///
/// Dependencies keep the declaration order of the pass config and point at
/// the same descriptors held in the survivor map; nothing is mutated during
/// resolution.
#[derive(Clone, Debug)]
pub struct ResolvedPass {
    pub descriptor: Rc<PassDescriptor>,
    pub dependencies: Vec<Rc<PassDescriptor>>,
}

impl ResolvedPass {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Orchestrates discovery, the filter pipeline, and dependency
/// cross-referencing for one run.
pub struct ResolutionEngine<'a> {
    features: &'a FeatureTable,
    toolchain: VersionSpec,
    diag: &'a Diagnostics,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(features: &'a FeatureTable, toolchain: VersionSpec, diag: &'a Diagnostics) -> Self {
        ResolutionEngine {
            features,
            toolchain,
            diag,
        }
    }

    /// Discover and resolve in one step.
    pub fn run(&self, passes_root: &Path) -> Result<BTreeMap<String, ResolvedPass>> {
        let discovered = self.discover(passes_root)?;
        Ok(self.resolve(discovered)?)
    }

    /// Load a descriptor from every direct child directory of `passes_root`.
    ///
    /// A directory that fails to load is noted and skipped; it never aborts
    /// discovery of its siblings. Directories are visited in sorted name
    /// order, and a later pass sharing an earlier pass's name silently
    /// replaces it in the working set.
    pub fn discover(&self, passes_root: &Path) -> Result<BTreeMap<String, Rc<PassDescriptor>>> {
        let entries = fs::read_dir(passes_root).with_context(|| {
            format!("unable to read passes directory {}", passes_root.display())
        })?;

        let mut directories = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("unable to read entry under {}", passes_root.display())
            })?;
            let path = entry.path();
            if path.is_dir() {
                directories.push(path);
            }
        }
        directories.sort();

        let mut discovered = BTreeMap::new();
        for directory in directories {
            self.diag
                .note(format!("looking for pass in {}", directory.display()));
            match load_descriptor(&directory, self.features, self.diag) {
                Ok(pass) => {
                    discovered.insert(pass.name.clone(), Rc::new(pass));
                }
                Err(err) => {
                    self.diag
                        .note(format!("skipping {}: {err}", directory.display()));
                }
            }
        }
        Ok(discovered)
    }

    /// Filter the discovered set and resolve dependencies.
    ///
    /// Returns the survivor map on success; on failure the error carries
    /// every attributed reason gathered in the failing stage.
    pub fn resolve(
        &self,
        discovered: BTreeMap<String, Rc<PassDescriptor>>,
    ) -> Result<BTreeMap<String, ResolvedPass>, ResolveError> {
        let mut filtered: BTreeMap<String, FilterReason> = BTreeMap::new();

        // Enablement gate.
        let mut enabled_passes = BTreeMap::new();
        for (name, pass) in discovered {
            if pass.enabled {
                enabled_passes.insert(name, pass);
            } else {
                filtered.insert(name, FilterReason::Disabled);
            }
        }
        // Everything enabled here must still be present after the version
        // gate; the completeness check below holds the pipeline to that.
        let enabled_names: Vec<String> = enabled_passes.keys().cloned().collect();

        // Toolchain-version gate.
        let mut survivors = BTreeMap::new();
        for (name, pass) in enabled_passes {
            if pass.toolchain_version.matches(&self.toolchain) {
                survivors.insert(name, pass);
            } else {
                filtered.insert(name, FilterReason::IncompatibleToolchain);
            }
        }

        for (name, reason) in &filtered {
            self.diag
                .note(format!("filtered pass \"{name}\": {reason}"));
        }

        // Completeness check over the enabled set.
        let mut report = FailureReport::default();
        for name in &enabled_names {
            if survivors.contains_key(name) {
                continue;
            }
            match filtered.get(name) {
                Some(reason) => report.push(format!(
                    "enabled pass \"{name}\" cannot be applied because: {reason}"
                )),
                // Unreachable while the gates above record every exclusion;
                // still fail cleanly instead of proceeding on bad bookkeeping.
                None => report.push(format!(
                    "enabled pass \"{name}\" is missing from the working set \
                     with no recorded reason (internal error)"
                )),
            }
        }
        if !report.is_empty() {
            return Err(ResolveError::EnablementIncomplete { report });
        }

        // Dependency cross-referencing over the survivor set.
        let mut report = FailureReport::default();
        let mut resolved = BTreeMap::new();
        for (name, pass) in &survivors {
            let mut dependencies = Vec::with_capacity(pass.dependencies.len());
            for dep in &pass.dependencies {
                match survivors.get(&dep.target) {
                    None => {
                        let mut failure = format!(
                            "missing pass \"{}\", required by pass \"{name}\"",
                            dep.target
                        );
                        if let Some(reason) = filtered.get(&dep.target) {
                            failure.push_str(&format!(
                                "; pass \"{}\" exists but was filtered because: {reason}",
                                dep.target
                            ));
                        }
                        report.push(failure);
                    }
                    Some(target) if !target.version.matches(&dep.required_version) => {
                        report.push(format!(
                            "pass \"{}\" has version {}, but pass \"{name}\" requires version {}",
                            target.name, target.version, dep.required_version
                        ));
                    }
                    Some(target) => dependencies.push(Rc::clone(target)),
                }
            }
            resolved.insert(
                name.clone(),
                ResolvedPass {
                    descriptor: Rc::clone(pass),
                    dependencies,
                },
            );
        }
        if !report.is_empty() {
            return Err(ResolveError::Dependency { report });
        }

        Ok(resolved)
    }
}
