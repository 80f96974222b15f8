use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use cryptstrap::cli::{Cli, Commands, LogLevel};

#[test]
fn test_parse_install_command() -> Result<()> {
    let args = Cli::parse_from(["cryptstrap", "install", "--file", "laptop.yaml"]);

    match args.command {
        Commands::Install(opts) => {
            assert_eq!(opts.file, "laptop.yaml");
            assert_eq!(opts.device, None);
            assert_eq!(opts.log_level, LogLevel::Info);
            assert!(!opts.dry_run);
            assert!(!opts.skip_preflight);
        }
        _ => panic!("Expected Install command"),
    }

    Ok(())
}

#[test]
fn test_parse_install_command_with_flags() -> Result<()> {
    let args = Cli::parse_from([
        "cryptstrap",
        "install",
        "-f",
        "laptop.yaml",
        "--device",
        "/dev/nvme0n1",
        "--dry-run",
        "--skip-preflight",
        "-l",
        "debug",
    ]);

    match args.command {
        Commands::Install(opts) => {
            assert_eq!(opts.device, Some(Utf8PathBuf::from("/dev/nvme0n1")));
            assert_eq!(opts.log_level, LogLevel::Debug);
            assert!(opts.dry_run);
            assert!(opts.skip_preflight);
        }
        _ => panic!("Expected Install command"),
    }

    Ok(())
}

#[test]
fn test_install_defaults_to_profile_yaml() -> Result<()> {
    let args = Cli::parse_from(["cryptstrap", "install"]);

    match args.command {
        Commands::Install(opts) => assert_eq!(opts.file, "profile.yaml"),
        _ => panic!("Expected Install command"),
    }

    Ok(())
}

#[test]
fn test_parse_validate_command() -> Result<()> {
    let args = Cli::parse_from(["cryptstrap", "validate", "--file", "test.yaml"]);

    match args.command {
        Commands::Validate(opts) => {
            assert_eq!(opts.file, "test.yaml");
        }
        _ => panic!("Expected Validate command"),
    }

    Ok(())
}

#[test]
fn test_parse_devices_command() -> Result<()> {
    let args = Cli::parse_from(["cryptstrap", "devices"]);

    match args.command {
        Commands::Devices(ref opts) => {
            assert_eq!(opts.file, None);
            assert_eq!(opts.log_level, LogLevel::Warn);
        }
        _ => panic!("Expected Devices command"),
    }
    assert_eq!(args.command.log_level(), Some(LogLevel::Warn));

    Ok(())
}

#[test]
fn test_completions_has_no_log_level() {
    let args = Cli::parse_from(["cryptstrap", "completions", "bash"]);
    assert_eq!(args.command.log_level(), None);
}

#[test]
fn test_there_is_no_confirmation_bypass() {
    let result = Cli::try_parse_from(["cryptstrap", "install", "--yes"]);
    assert!(result.is_err(), "the confirmation gate must not be skippable");
}

#[test]
fn test_invalid_log_level_rejected() {
    let result = Cli::try_parse_from(["cryptstrap", "install", "--log-level", "loud"]);
    assert!(result.is_err());
}

#[test]
fn test_missing_subcommand_rejected() {
    let result = Cli::try_parse_from(["cryptstrap"]);
    assert!(result.is_err());
}
