use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the system described by the given profile
    Install(InstallArgs),

    /// Validate the given YAML profile
    Validate(ValidateArgs),

    /// List the block devices eligible as installation target
    Devices(DevicesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Log level requested by the subcommand, if it takes one.
    pub fn log_level(&self) -> Option<LogLevel> {
        match self {
            Commands::Install(opts) => Some(opts.log_level),
            Commands::Validate(opts) => Some(opts.log_level),
            Commands::Devices(opts) => Some(opts.log_level),
            Commands::Completions(_) => None,
        }
    }
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Path to the YAML file defining the profile
    #[arg(short, long, default_value = "profile.yaml")]
    pub file: Utf8PathBuf,

    /// Install onto this device instead of choosing from a menu
    #[arg(short, long)]
    pub device: Option<Utf8PathBuf>,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Do not run, just show what would be done
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the environment checks (commands, root, UEFI)
    #[arg(long)]
    pub skip_preflight: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the YAML file to validate
    #[arg(short, long, default_value = "profile.yaml")]
    pub file: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct DevicesArgs {
    /// Path to the YAML file providing the device pattern
    #[arg(short, long)]
    pub file: Option<Utf8PathBuf>,

    /// Set the log level
    #[arg(short, long, default_value = "warn")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// This enum maps directly to the log levels used by the `tracing` crate.
/// Collaborator stdout is logged at `info` and stderr at `warn`, so `warn`
/// hides tool progress and `debug`/`trace` add per-command detail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
