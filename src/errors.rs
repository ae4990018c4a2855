use std::panic::{self, PanicHookInfo};

use color_eyre::{config::HookBuilder, eyre::Result};

use crate::{logging::log_panic, tui};

/// Install panic and error hooks.
///
/// A panic leaves the terminal in raw mode unless it is restored before the
/// report is printed, so the panic hook logs, restores, then reports.
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = HookBuilder::default()
        .panic_section(format!(
            "This is a bug in motra-presale. Please report it at {}",
            env!("CARGO_PKG_REPOSITORY")
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(true)
        .display_env_section(false)
        .into_hooks();

    eyre_hook.install()?;

    let report = panic_hook.into_panic_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        log_panic(info);
        restore_terminal();
        report(info);
    }));

    Ok(())
}

fn restore_terminal() {
    if let Err(e) = tui::restore() {
        eprintln!("Failed to restore terminal: {e}");
    }
}
