//! CLI entry point for pass selection.
//!
//! Thin glue over the library: parse arguments, load the feature table,
//! build the requested toolchain spec, run the resolution engine, and invoke
//! the build/apply hooks on the survivors. All failure paths print their
//! accumulated diagnostics to stderr and exit nonzero.

use anyhow::{Context, Result};
use passrig::{
    Diagnostics, FeatureTable, PassHooks, ResolutionEngine, ResolvedPass, VersionSpec, run_passes,
};
use std::env;
use std::path::PathBuf;

const KEY_PREFIX: &str = "CONFIG_";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let diag = Diagnostics::new(cli.verbose);

    let toolchain = match &cli.toolchain {
        Some(raw) => raw.parse::<VersionSpec>().with_context(|| {
            format!("could not parse requested toolchain version \"{raw}\"")
        })?,
        None => VersionSpec::WILDCARD,
    };

    let features = FeatureTable::load(&cli.config_path, KEY_PREFIX)?;
    if diag.is_verbose() {
        for (key, value) in features.entries() {
            diag.note(format!("config: {key} = {value}"));
        }
    }
    diag.note(format!("toolchain version = {toolchain}"));

    let engine = ResolutionEngine::new(&features, toolchain, &diag);
    let survivors = engine.run(&cli.passes_dir)?;

    let mut hooks = LoggingHooks { diag: &diag };
    run_passes(&survivors, &mut hooks)
}

struct Cli {
    passes_dir: PathBuf,
    config_path: PathBuf,
    toolchain: Option<String>,
    verbose: bool,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut passes_dir = None;
        let mut config_path = None;
        let mut toolchain = None;
        let mut verbose = false;

        let mut args = env::args();
        let _program = args.next();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--kconfig" | "-kc" => {
                    let Some(value) = args.next() else {
                        usage(1);
                    };
                    config_path = Some(PathBuf::from(value));
                }
                "--llvm-version" | "-lv" => {
                    let Some(value) = args.next() else {
                        usage(1);
                    };
                    toolchain = Some(value);
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => usage(0),
                other if other.starts_with('-') => usage(1),
                other => {
                    if passes_dir.is_some() {
                        usage(1);
                    }
                    passes_dir = Some(PathBuf::from(other));
                }
            }
        }

        let Some(passes_dir) = passes_dir else {
            usage(1);
        };

        Ok(Cli {
            passes_dir,
            config_path: config_path.unwrap_or_else(|| PathBuf::from(".config")),
            toolchain,
            verbose,
        })
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: passrig [dir] [options]\n\nArguments:\n  [dir]                       Directory whose child directories each hold one pass config.\n\nOptions:\n  -kc, --kconfig <path>       Kconfig-style feature file (default: ./.config).\n  -lv, --llvm-version <spec>  Requested toolchain version, e.g. 14, 14.2, or 14.*.1 (default: any).\n  -v,  --verbose              Print discovery and filtering notes.\n  -h,  --help                 Show this help."
    );
    std::process::exit(code);
}

struct LoggingHooks<'a> {
    diag: &'a Diagnostics,
}

impl PassHooks for LoggingHooks<'_> {
    fn build(&mut self, pass: &ResolvedPass) -> Result<()> {
        self.diag.note(format!("building pass {}", pass.name()));
        Ok(())
    }

    fn apply(&mut self, pass: &ResolvedPass) -> Result<()> {
        self.diag.note(format!("applying pass {}", pass.name()));
        Ok(())
    }
}
