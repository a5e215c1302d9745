//! Config subcommand handlers.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use dialoguer::{Input, Select};

use repeater_config::{Config, GroupProfile, SupplicantProfile, load_config, save_config};
use repeater_core::{MacAddress, Ssid};

use super::config_file;
use super::set::validate_passphrase;
use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn redact(config: &mut Config) {
    if config.settings.passphrase.is_some() {
        config.settings.passphrase = Some(REDACTED.into());
    }
    if let Some(ref mut group) = config.group {
        if group.passphrase.is_some() {
            group.passphrase = Some(REDACTED.into());
        }
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let mut config = load_config(&path)?;
            redact(&mut config);
            let rendered = match global.output.unwrap_or(OutputFormat::Table) {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&config)
                    .map_err(|e| CliError::Output(e.to_string()))?,
                format => output::render_single(format, &config, |_| String::new(), |_| String::new())?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(&path, global),
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(path: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "interactive".into(),
            reason: "config init needs a terminal".into(),
        });
    }
    if path.exists() {
        let overwrite = global.yes
            || dialoguer::Confirm::new()
                .with_prompt(format!("{} exists. Overwrite?", path.display()))
                .default(false)
                .interact()
                .map_err(prompt_err)?;
        if !overwrite {
            return Err(CliError::Cancelled);
        }
    }

    eprintln!("repeater configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut config = Config::default();

    // 1. Platform
    config.platform.api_level = Input::new()
        .with_prompt("Platform API level")
        .default(config.platform.api_level)
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Source of the configuration
    let sources = &["Captured Wi-Fi Direct group", "Safe mode (settings only)"];
    let source = Select::new()
        .with_prompt("Where does the hotspot configuration come from?")
        .items(sources)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if source == 0 {
        let network_name: String = Input::new()
            .with_prompt("Group network name")
            .default("DIRECT-rp-Repeater".into())
            .interact_text()
            .map_err(prompt_err)?;
        let frequency_mhz: u32 = Input::new()
            .with_prompt("Operating frequency (MHz, 0 if unknown)")
            .default(2437)
            .interact_text()
            .map_err(prompt_err)?;
        let device_address: String = Input::new()
            .with_prompt("Device P2P address (blank to skip)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_err)?;
        let device_address = match device_address.trim() {
            "" => None,
            raw => Some(MacAddress::parse(raw).map_err(|e| CliError::Validation {
                field: "device_address".into(),
                reason: e.to_string(),
            })?),
        };
        let conf_path: String = Input::new()
            .with_prompt("p2p_supplicant.conf path")
            .default(SupplicantProfile::default().conf_path().display().to_string())
            .interact_text()
            .map_err(prompt_err)?;

        config.supplicant.conf_path = Some(PathBuf::from(conf_path));
        config.group = Some(GroupProfile {
            network_name,
            passphrase: None,
            owner_address: None,
            security_type: repeater_core::SecurityType::default(),
            frequency_mhz,
            interface_name: "p2p-wlan0-0".into(),
            interface_address: None,
            device_address,
            active: true,
        });
    } else {
        let ssid: String = Input::new()
            .with_prompt("Network name")
            .interact_text()
            .map_err(prompt_err)?;
        let ssid = Ssid::from_utf8_text(&ssid);
        ssid.validate().map_err(|e| CliError::Validation {
            field: "ssid".into(),
            reason: e.to_string(),
        })?;
        let passphrase = rpassword::prompt_password("Passphrase: ").map_err(prompt_err)?;
        validate_passphrase(&passphrase)?;

        config.settings.safe_mode = true;
        config.settings.network_name = Some(ssid);
        config.settings.passphrase = Some(passphrase);
    }

    save_config(path, &config)?;
    eprintln!("\n   Config saved to {}", path.display());
    Ok(())
}
