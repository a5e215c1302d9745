//! `repeater toggle` and `repeater wps`.

use std::io::IsTerminal;

use repeater_config::update_group;
use repeater_core::ToggleOutcome;

use super::Context;
use crate::cli::WpsArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "toggle".into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

pub async fn toggle(ctx: &Context) -> Result<(), CliError> {
    if ctx.config.group.is_none() {
        return Err(ctx.unavailable());
    }
    let session = ctx.connect().await;
    if session.manager.view().service_started
        && !confirm("Stop the repeater? Connected clients will drop.", ctx.yes)?
    {
        session.close().await;
        return Err(CliError::Cancelled);
    }

    let outcome = session.manager.toggle().await;
    session.close().await;
    match outcome {
        ToggleOutcome::StartRequested => {
            update_group(&ctx.path, |g| g.active = true)?;
            ctx.print("Repeater starting");
            Ok(())
        }
        ToggleOutcome::ShutdownRequested => {
            update_group(&ctx.path, |g| g.active = false)?;
            ctx.print("Repeater stopped");
            Ok(())
        }
        ToggleOutcome::Ignored => Err(CliError::NotRunning),
    }
}

fn validate_pin(pin: &str) -> Result<(), CliError> {
    if matches!(pin.len(), 4 | 8) && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "pin".into(),
            reason: "must be 4 or 8 digits".into(),
        })
    }
}

pub async fn wps(ctx: &Context, args: WpsArgs) -> Result<(), CliError> {
    if let Some(ref pin) = args.pin {
        validate_pin(pin)?;
    }
    let push_button = args.pin.is_none();
    let session = ctx.connect().await;
    let started = session.manager.wps(args.pin).await;
    session.close().await;
    if !started {
        return Err(CliError::NotRunning);
    }
    ctx.print(if push_button {
        "WPS started (push button)"
    } else {
        "WPS started with PIN"
    });
    Ok(())
}
