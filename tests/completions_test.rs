//! Shell completion scripts: parsing of the shell argument, generation
//! through `run_completions`, and the binary's stdout.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use cryptstrap::cli::{Cli, Commands, CompletionsArgs};

#[test]
fn test_completions_command_parsing() -> Result<()> {
    let shells = [
        ("bash", Shell::Bash),
        ("zsh", Shell::Zsh),
        ("fish", Shell::Fish),
        ("powershell", Shell::PowerShell),
        ("elvish", Shell::Elvish),
    ];

    for (shell_str, expected_shell) in shells {
        let args = Cli::parse_from(["cryptstrap", "completions", shell_str]);
        match args.command {
            Commands::Completions(opts) => {
                assert_eq!(opts.shell, expected_shell, "Mismatched shell for '{}'", shell_str);
            }
            _ => panic!("Expected Completions command for shell '{}'", shell_str),
        }
    }

    Ok(())
}

#[test]
fn test_completions_generation() -> Result<()> {
    let mut buffer = Vec::new();

    for shell in Shell::value_variants() {
        buffer.clear();
        cryptstrap::run_completions(&CompletionsArgs { shell: *shell }, &mut buffer)?;
        assert!(!buffer.is_empty(), "Generated completion for {:?} was empty", shell);
    }

    Ok(())
}

/// Every subcommand and the install flags show up in the generated scripts.
#[test]
fn test_completion_contents() -> Result<()> {
    let test_cases = [
        (Shell::Bash, &["cryptstrap", "install", "validate", "devices", "completions"] as &[_]),
        (Shell::Zsh, &["#compdef cryptstrap", "install", "--dry-run"]),
        (Shell::Fish, &["cryptstrap", "install", "devices", "skip-preflight"]),
    ];

    for (shell, patterns) in test_cases {
        let mut buffer = Vec::new();
        cryptstrap::run_completions(&CompletionsArgs { shell }, &mut buffer)?;
        let output = String::from_utf8(buffer)?;

        for pattern in patterns {
            assert!(
                output.contains(pattern),
                "Pattern '{}' not found in {:?} completions",
                pattern,
                shell
            );
        }
    }

    Ok(())
}

#[test]
fn test_cli_completions_output() -> Result<()> {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cryptstrap"))
        .args(["completions", "bash"])
        .output()?;

    assert!(output.status.success(), "Command failed");
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("cryptstrap"));
    assert!(stdout.contains("install"));

    Ok(())
}

#[test]
fn test_invalid_shell_rejected() {
    let result = Cli::try_parse_from(["cryptstrap", "completions", "invalid-shell"]);
    assert!(result.is_err(), "Expected parsing to fail for invalid shell");
}
