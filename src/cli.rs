//! CLI surface (§6): flags, values, and the `run` worker sub-invocation
//! [`crate::parallel::WorkerPool`] spawns for `--parallel`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Firmo: core execution engine for a BDD-style testing framework.
#[derive(Parser, Debug)]
#[command(name = "firmo")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Test files or directories to run (first directory becomes the base search root)
    pub paths: Vec<PathBuf>,

    /// Collect line coverage
    #[arg(long, short = 'c')]
    pub coverage: bool,

    /// Log every coverage hit as it is recorded (implies --coverage)
    #[arg(long)]
    pub coverage_debug: bool,

    /// Grade tests against the quality rubric
    #[arg(long, short = 'q')]
    pub quality: bool,

    /// Minimum quality level to require (1-5)
    #[arg(long, value_name = "N")]
    pub quality_level: Option<u8>,

    /// Coverage threshold percentage; below it the run fails
    #[arg(long, value_name = "N")]
    pub threshold: Option<f64>,

    /// Watch for file changes and re-run
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Enable the interactive watch-mode keyboard interface
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Run one worker process per file
    #[arg(long, short = 'p')]
    pub parallel: bool,

    /// Number of parallel worker processes (default: available CPUs)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Write reports via the reporting auto-save pipeline
    #[arg(long, short = 'r')]
    pub report: bool,

    /// Emit a single JSON result object instead of console output
    #[arg(long)]
    pub json: bool,

    /// Verbose console output
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Glob selecting which discovered files count as test files
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Only run tests whose name matches this pattern
    #[arg(long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Path to a config file (default: search .firmo-config.json upward)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory reports are written under
    #[arg(long, value_name = "PATH")]
    pub report_dir: Option<PathBuf>,

    /// Comma-separated list of report formats to auto-save
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub report_formats: Vec<String>,

    /// Console output style
    #[arg(long, value_enum, default_value_t = ConsoleFormat::Default)]
    pub console_format: ConsoleFormat,

    /// Write a default .firmo-config.json in the current directory and exit
    #[arg(long)]
    pub create_config: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConsoleFormat {
    Default,
    Dot,
    Summary,
    #[value(name = "json_dump_internal")]
    JsonDumpInternal,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single file and print its FileResult bracketed by RESULTS_JSON_BEGIN/END.
    /// Invoked by the parallel worker pool; not meant for interactive use.
    Run {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

/// Long flag names [`Args`] already knows; anything else of the form
/// `--key=value` is an override destined for [`crate::config::Config::set_path`]
/// rather than a parse error (§6 "arbitrary `--key=value`").
const KNOWN_LONG_FLAGS: &[&str] = &[
    "coverage",
    "coverage-debug",
    "quality",
    "quality-level",
    "threshold",
    "watch",
    "interactive",
    "parallel",
    "jobs",
    "report",
    "json",
    "verbose",
    "pattern",
    "filter",
    "config",
    "report-dir",
    "report-formats",
    "console-format",
    "create-config",
    "help",
    "version",
];

/// Splits raw CLI args into the subset clap understands and a list of
/// `(key, value)` overrides for anything else shaped like `--key=value`.
pub fn split_overrides(raw_args: impl Iterator<Item = String>) -> (Vec<String>, Vec<(String, String)>) {
    let mut known = Vec::new();
    let mut overrides = Vec::new();
    for arg in raw_args {
        if let Some(rest) = arg.strip_prefix("--") {
            if let Some((key, value)) = rest.split_once('=') {
                if !KNOWN_LONG_FLAGS.contains(&key) {
                    overrides.push((key.to_string(), value.to_string()));
                    continue;
                }
            }
        }
        known.push(arg);
    }
    (known, overrides)
}
