//! Command line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print the discovered catalog.
    Discover,
    /// Stream records for the selected streams of a catalog.
    Sync {
        catalog: PathBuf,
        state: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(version, about)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["discover", "catalog"])
))]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Run discovery and print the catalog to stdout
    #[arg(short, long)]
    pub discover: bool,

    /// Path to a catalog with selected streams
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to the state left by a previous run
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Log level, unless overridden by RUST_LOG
    #[arg(long, value_enum, default_value = "INFO")]
    pub log_level: LogLevel,
}

impl CliArgs {
    /// Resolve the run mode. Discovery wins when both flags are given.
    pub fn mode(&self) -> Mode {
        match (&self.catalog, self.discover) {
            (Some(catalog), false) => Mode::Sync {
                catalog: catalog.clone(),
                state: self.state.clone(),
            },
            _ => Mode::Discover,
        }
    }
}
