//! LUKS container setup.

use anyhow::{Context, Result};

use super::StepContext;
use crate::executor::run_checked;
use crate::prompt::prompt_secret;

/// Asks for the passphrase, formats the LUKS partition and opens it.
///
/// The passphrase reaches `cryptsetup` only through stdin (`--key-file -`)
/// and is zeroized when this function returns.
pub(super) fn encrypt(ctx: &StepContext<'_>) -> Result<()> {
    let partition = ctx.luks_partition();
    let mapper = &ctx.profile.encryption.mapper_name;

    let secret = prompt_secret(ctx.terminal)?;

    let mut format_args = vec!["luksFormat".to_string(), "--batch-mode".to_string()];
    format_args.extend(ctx.profile.encryption.format_args.iter().cloned());
    format_args.extend(["--key-file".to_string(), "-".to_string(), partition.to_string()]);

    let format = ctx.command("cryptsetup", format_args).with_stdin(secret.to_stdin_payload());
    run_checked(ctx.executor, &format)
        .with_context(|| format!("failed to format LUKS container on {}", partition))?;

    let open = ctx
        .command("cryptsetup", ["open", "--key-file", "-", partition.as_str(), mapper.as_str()])
        .with_stdin(secret.to_stdin_payload());
    run_checked(ctx.executor, &open)
        .with_context(|| format!("failed to open LUKS container {} as {}", partition, mapper))?;

    drop(secret);
    Ok(())
}
