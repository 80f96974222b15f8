pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod plan;
pub mod preflight;
pub mod privilege;
pub mod prompt;
pub mod sequencer;

pub use error::CryptstrapError;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::device::DeviceSelector;
use crate::executor::CommandExecutor;
use crate::plan::StepContext;
use crate::prompt::Terminal;
use crate::sequencer::StepSequencer;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Loads and validates a profile.
fn load_valid_profile(file: &camino::Utf8Path) -> Result<config::Profile> {
    let profile = config::load_profile(file)
        .with_context(|| format!("failed to load profile from {}", file))?;
    profile.validate().context("profile validation failed")?;
    Ok(profile)
}

fn destruction_notice(device: &device::DeviceChoice) -> String {
    format!(
        "ALL DATA ON {} WILL BE DESTROYED: the disk is repartitioned, encrypted and \
        formatted. Completed steps cannot be undone if a later step fails.",
        device
    )
}

/// Runs a complete installation.
///
/// Order of interaction: disk menu (unless `--device`), the yes/no gate,
/// then the passphrase prompts from inside the `encrypt` step. Nothing is
/// executed before the gate has been passed.
pub fn run_install(
    opts: &cli::InstallArgs,
    executor: Arc<dyn CommandExecutor>,
    terminal: &dyn Terminal,
    selector: Option<DeviceSelector>,
) -> Result<()> {
    let profile = load_valid_profile(&opts.file)?;

    if opts.dry_run || opts.skip_preflight {
        info!("skipping preflight checks");
    } else {
        preflight::verify(&profile)?;
    }

    let selector = match selector {
        Some(selector) => selector,
        None => DeviceSelector::new(profile.device_regex()?),
    };
    let device = selector.select(terminal, opts.device.as_deref())?;

    prompt::require_confirmation(terminal, &destruction_notice(&device))?;

    let ctx = StepContext {
        profile: &profile,
        device: &device,
        executor: executor.as_ref(),
        terminal,
    };
    StepSequencer::new(plan::build_steps(ctx)).run()?;

    info!("installation onto {} completed", device);
    Ok(())
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let profile = load_valid_profile(&opts.file)?;
    info!("validation successful:\n{:#?}", profile);
    Ok(())
}

/// Prints the eligible devices, one per line.
pub fn run_devices(
    opts: &cli::DevicesArgs,
    selector: Option<DeviceSelector>,
    out: &mut dyn Write,
) -> Result<()> {
    let profile = match &opts.file {
        Some(file) => load_valid_profile(file)?,
        None => config::Profile::default(),
    };
    let selector = match selector {
        Some(selector) => selector,
        None => DeviceSelector::new(profile.device_regex()?),
    };

    let devices = selector.eligible()?;
    if devices.is_empty() {
        return Err(CryptstrapError::NoEligibleDevice {
            pattern: selector.pattern().to_string(),
        }
        .into());
    }
    for device in devices {
        writeln!(out, "{}", device.menu_label()).context("failed to write device list")?;
    }
    Ok(())
}

pub fn run_completions(opts: &cli::CompletionsArgs, out: &mut dyn Write) -> Result<()> {
    let mut cmd = cli::Cli::command();
    clap_complete::generate(opts.shell, &mut cmd, env!("CARGO_PKG_NAME"), out);
    Ok(())
}
