//! Diagnostics sink shared by discovery and resolution.
//!
//! Components take the sink explicitly instead of consulting a process-wide
//! verbosity flag, so the engine stays a pure function of its inputs plus
//! this one side channel. Notes are chatter and only surface in verbose
//! mode; warnings always reach stderr.

#[derive(Clone, Copy, Debug, Default)]
pub struct Diagnostics {
    verbose: bool,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Diagnostics { verbose }
    }

    /// A sink that drops notes; used by library callers and tests.
    pub fn quiet() -> Self {
        Diagnostics { verbose: false }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Verbose-only progress note.
    pub fn note(&self, message: impl AsRef<str>) {
        if self.verbose {
            eprintln!("{}", message.as_ref());
        }
    }

    /// Unconditional warning.
    pub fn warn(&self, message: impl AsRef<str>) {
        eprintln!("{}", message.as_ref());
    }
}
