//! `repeater safe-mode on|off`.

use tracing::{info, warn};

use repeater_core::{RepeaterSettings, SettingsStore, Ssid};

use super::Context;
use super::set::{invalid, validate_passphrase};
use crate::cli::{SafeModeArgs, Switch};
use crate::error::CliError;

pub fn handle(ctx: &Context, args: &SafeModeArgs) -> Result<(), CliError> {
    let enabled = args.state == Switch::On;
    let ssid = args.ssid.as_deref().map(Ssid::from_utf8_text);
    if let Some(ref ssid) = ssid {
        ssid.validate().map_err(|e| invalid("ssid", e.to_string()))?;
    }
    if let Some(ref passphrase) = args.passphrase {
        validate_passphrase(passphrase)?;
    }

    let settings = ctx.settings();
    settings.modify(&mut |s: &mut RepeaterSettings| {
        s.safe_mode = enabled;
        if ssid.is_some() {
            s.network_name.clone_from(&ssid);
        }
        if args.passphrase.is_some() {
            s.passphrase.clone_from(&args.passphrase);
        }
    })?;
    info!(enabled, "safe mode switched");

    let current = settings.load();
    if enabled && (current.network_name.is_none() || current.passphrase.is_none()) {
        warn!("safe mode has no network name or passphrase yet");
        ctx.print("Safe mode on. Add credentials with: repeater safe-mode on --ssid NAME --passphrase PASS");
    } else {
        ctx.print(if enabled { "Safe mode on" } else { "Safe mode off" });
    }
    Ok(())
}
