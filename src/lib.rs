//! Pass selection and dependency resolution for per-directory build passes.
//!
//! The crate answers one question per run: given a Kconfig-style feature
//! table and a requested toolchain version, which of the passes registered
//! under a passes root should be active, and do their declared dependencies
//! hold together? [`ResolutionEngine`] owns that pipeline; the CLI in
//! `src/bin/passrig.rs` wires it to argument parsing and the build/apply
//! hooks.

use anyhow::Result;
use std::collections::BTreeMap;

pub mod descriptor;
pub mod diagnostics;
pub mod features;
pub mod resolve;
pub mod version;

pub use descriptor::{ConfigError, DependencySpec, PassDescriptor, load_descriptor};
pub use diagnostics::Diagnostics;
pub use features::FeatureTable;
pub use resolve::{FailureReport, FilterReason, ResolutionEngine, ResolveError, ResolvedPass};
pub use version::{VersionError, VersionSpec};

/// Build/apply stages invoked once per surviving pass.
///
/// The engine makes no ordering promise beyond the survivor map's iteration
/// order; implementations must not rely on dependencies having been built
/// before their dependents.
pub trait PassHooks {
    fn build(&mut self, pass: &ResolvedPass) -> Result<()>;
    fn apply(&mut self, pass: &ResolvedPass) -> Result<()>;
}

/// Run `build` then `apply` for every surviving pass.
pub fn run_passes(
    passes: &BTreeMap<String, ResolvedPass>,
    hooks: &mut dyn PassHooks,
) -> Result<()> {
    for pass in passes.values() {
        hooks.build(pass)?;
        hooks.apply(pass)?;
    }
    Ok(())
}
