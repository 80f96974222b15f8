//! Configuration of the installed system.

use anyhow::{Context, Result};
use camino::Utf8Path;

use super::StepContext;

/// Returns the `locale.gen` entry for a locale such as `en_US.UTF-8`.
pub(crate) fn locale_gen_entry(locale: &str) -> String {
    let charset = locale.split_once('.').map_or("UTF-8", |(_, charset)| charset);
    format!("{} {}\n", locale, charset)
}

/// Writes hostname, locale and console settings and sets the clock.
pub(super) fn configure(ctx: &StepContext<'_>) -> Result<()> {
    let system = &ctx.profile.system;

    ctx.write_file(Utf8Path::new("/etc/hostname"), "0644", &format!("{}\n", system.hostname))?;
    ctx.write_file(
        Utf8Path::new("/etc/locale.gen"),
        "0644",
        &locale_gen_entry(&system.locale),
    )?;
    ctx.write_file(
        Utf8Path::new("/etc/locale.conf"),
        "0644",
        &format!("LANG={}\n", system.locale),
    )?;
    ctx.write_file(
        Utf8Path::new("/etc/vconsole.conf"),
        "0644",
        &format!("KEYMAP={}\n", system.keymap),
    )?;

    let zoneinfo = format!("/usr/share/zoneinfo/{}", system.timezone);
    ctx.chroot("ln", ["-sf", zoneinfo.as_str(), "/etc/localtime"])
        .with_context(|| format!("failed to set timezone {}", system.timezone))?;
    ctx.chroot("hwclock", ["--systohc"])?;
    ctx.chroot("locale-gen", Vec::<String>::new())
        .with_context(|| format!("failed to generate locale {}", system.locale))?;
    Ok(())
}
