use std::process;
use std::sync::Arc;

use clap::Parser;
use cryptstrap::cli::{Cli, Commands};
use cryptstrap::executor::RealCommandExecutor;
use cryptstrap::prompt::DialoguerTerminal;
use cryptstrap::CryptstrapError;

fn main() {
    let args = Cli::parse();

    if let Some(log_level) = args.command.log_level()
        && let Err(e) = cryptstrap::init_logging(log_level)
    {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    let result = match &args.command {
        Commands::Install(opts) => {
            let executor = Arc::new(RealCommandExecutor {
                dry_run: opts.dry_run,
            });
            cryptstrap::run_install(opts, executor, &DialoguerTerminal::new(), None)
        }
        Commands::Validate(opts) => cryptstrap::run_validate(opts),
        Commands::Devices(opts) => cryptstrap::run_devices(opts, None, &mut std::io::stdout()),
        Commands::Completions(opts) => cryptstrap::run_completions(opts, &mut std::io::stdout()),
    };

    if let Err(e) = result {
        match e.downcast_ref::<CryptstrapError>() {
            Some(CryptstrapError::DeclinedConfirmation { .. }) => {
                tracing::error!("aborted at confirmation gate: nothing was changed");
            }
            Some(CryptstrapError::StepFailure { step, .. }) => {
                tracing::error!(step = %step, "installation stopped: {:#}", e);
            }
            _ => tracing::error!("{:#}", e),
        }
        if matches!(args.command, Commands::Completions(_)) {
            eprintln!("{:#}", e);
        }
        process::exit(1);
    }
}
