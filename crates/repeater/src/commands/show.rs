//! `repeater show`: resolve and print the hotspot configuration.

use serde::Serialize;

use repeater_core::{
    ApConfiguration, ConfigurationResolver, MacAddress, MacRandomization, SecurityType,
    VendorElement,
};

use super::Context;
use crate::cli::ShowArgs;
use crate::error::CliError;
use crate::output::{self, FieldRow};

const MASK: &str = "********";

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub safe_mode: bool,
    pub read_only: bool,
    pub ssid: Option<String>,
    pub passphrase: Option<String>,
    pub bssid: Option<MacAddress>,
    pub security_type: SecurityType,
    pub band: Option<String>,
    pub channel: Option<u16>,
    pub auto_shutdown: bool,
    pub shutdown_timeout_ms: u64,
    pub mac_randomization: MacRandomization,
    pub vendor_elements: Vec<VendorElement>,
}

impl ConfigView {
    pub fn new(config: &ApConfiguration, safe_mode: bool, read_only: bool, reveal: bool) -> Self {
        let first = config.channels.iter().next();
        Self {
            safe_mode,
            read_only,
            ssid: config.ssid.as_ref().map(ToString::to_string),
            passphrase: config.passphrase.as_ref().map(|p| {
                if reveal {
                    p.clone()
                } else {
                    MASK.to_owned()
                }
            }),
            bssid: config.bssid,
            security_type: config.security_type,
            band: first.map(|(band, _)| band.to_string()),
            channel: first.map(|(_, channel)| *channel),
            auto_shutdown: config.auto_shutdown_enabled,
            shutdown_timeout_ms: config.shutdown_timeout_millis,
            mac_randomization: config.mac_randomization,
            vendor_elements: config.vendor_elements.iter().cloned().collect(),
        }
    }
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".into(), ToString::to_string)
}

fn detail(v: &ConfigView) -> String {
    let mode = match (v.safe_mode, v.read_only) {
        (true, _) => "safe mode",
        (false, false) => "live group",
        (false, true) => "live group (read-only)",
    };
    let channel = match v.channel {
        Some(0) | None => "auto".to_owned(),
        Some(ch) => ch.to_string(),
    };
    let vendor = if v.vendor_elements.is_empty() {
        "-".to_owned()
    } else {
        v.vendor_elements
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    output::render_fields(vec![
        FieldRow { field: "Source", value: mode.into() },
        FieldRow { field: "SSID", value: opt(v.ssid.as_ref()) },
        FieldRow { field: "Passphrase", value: opt(v.passphrase.as_ref()) },
        FieldRow { field: "BSSID", value: opt(v.bssid.as_ref()) },
        FieldRow { field: "Security", value: v.security_type.to_string() },
        FieldRow { field: "Band", value: opt(v.band.as_ref()) },
        FieldRow { field: "Channel", value: channel },
        FieldRow { field: "Auto shutdown", value: v.auto_shutdown.to_string() },
        FieldRow {
            field: "Idle timeout",
            value: match v.shutdown_timeout_ms {
                0 => "default".into(),
                ms => format!("{ms} ms"),
            },
        },
        FieldRow { field: "MAC randomization", value: v.mac_randomization.to_string() },
        FieldRow { field: "Vendor elements", value: vendor },
    ])
}

pub async fn handle(ctx: &Context, args: &ShowArgs) -> Result<(), CliError> {
    let settings = ctx.settings();
    let caps = ctx.config.platform.capabilities();
    let binder = ctx.binder();
    let channel = ctx.channel();
    let resolution =
        ConfigurationResolver::new(settings.as_ref(), &caps, binder.as_deref(), &channel)
            .resolve()
            .await
            .map_err(|e| ctx.core_error(e))?;

    let view = ConfigView::new(
        &resolution.config,
        ctx.config.settings.safe_mode,
        resolution.read_only,
        args.show_passphrase,
    );
    let rendered = output::render_single(ctx.format, &view, detail, |v| opt(v.ssid.as_ref()))?;
    ctx.print(&rendered);
    Ok(())
}
