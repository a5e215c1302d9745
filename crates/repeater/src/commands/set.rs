//! `repeater set`: one configure cycle with the command-line flags acting
//! as the edit surface.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use repeater_config::update_group;
use repeater_core::model::channel_to_frequency;
use repeater_core::{
    ApConfiguration, Band, ConfigureOutcome, EditSurface, LifecycleState, MacAddress,
    SecurityType, Ssid, VendorElement,
};

use super::Context;
use super::show::ConfigView;
use crate::cli::{BandArg, SetArgs};
use crate::error::CliError;
use crate::output;
use crate::service::ServiceRequest;

/// Parsed and validated `set` flags.
#[derive(Debug)]
pub struct ConfigEdits {
    ssid: Option<Ssid>,
    passphrase: Option<SecretString>,
    bssid: Option<MacAddress>,
    clear_bssid: bool,
    security: Option<SecurityType>,
    band: Option<Band>,
    channel: Option<u16>,
    auto_shutdown: Option<bool>,
    shutdown_timeout: Option<u64>,
    clear_vendor_elements: bool,
    vendor_elements: Vec<VendorElement>,
}

pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

impl From<BandArg> for Band {
    fn from(arg: BandArg) -> Self {
        match arg {
            BandArg::Auto => Band::LEGACY,
            BandArg::Ghz2 => Band::GHZ_2,
            BandArg::Ghz5 => Band::GHZ_5,
            BandArg::Ghz6 => Band::GHZ_6,
            BandArg::Ghz60 => Band::GHZ_60,
        }
    }
}

impl ConfigEdits {
    /// Validate the flags, prompting for the passphrase when asked to.
    pub fn from_args(args: SetArgs) -> Result<Self, CliError> {
        let ssid = match (args.ssid, args.ssid_hex) {
            (Some(text), _) => Some(Ssid::from_utf8_text(&text)),
            (None, Some(hex)) => Some(
                Ssid::from_supplicant(&hex).map_err(|e| invalid("ssid-hex", e.to_string()))?,
            ),
            (None, None) => None,
        };
        if let Some(ref ssid) = ssid {
            ssid.validate().map_err(|e| invalid("ssid", e.to_string()))?;
        }

        let passphrase = if args.ask_passphrase {
            let entered = rpassword::prompt_password("Passphrase: ")
                .map_err(|e| invalid("passphrase", format!("prompt failed: {e}")))?;
            Some(SecretString::from(entered))
        } else {
            args.passphrase.map(SecretString::from)
        };
        if let Some(ref passphrase) = passphrase {
            validate_passphrase(passphrase.expose_secret())?;
        }

        let band = args.band.map(Band::from);
        if let Some(channel) = args.channel.filter(|c| *c != 0) {
            match band {
                Some(band) if band != Band::LEGACY => {
                    if channel_to_frequency(channel, band).is_none() {
                        return Err(invalid("channel", format!("{channel} is not a {band} channel")));
                    }
                }
                _ => {
                    if Band::for_channel(channel).is_none() {
                        return Err(invalid(
                            "channel",
                            format!("{channel} needs an explicit --band"),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            ssid,
            passphrase,
            bssid: args.bssid,
            clear_bssid: args.clear_bssid,
            security: args.security,
            band,
            channel: args.channel,
            auto_shutdown: args.auto_shutdown,
            shutdown_timeout: args.shutdown_timeout,
            clear_vendor_elements: args.clear_vendor_elements,
            vendor_elements: args.vendor_elements,
        })
    }

    pub fn touches_credentials(&self) -> bool {
        self.ssid.is_some() || self.passphrase.is_some() || self.bssid.is_some() || self.clear_bssid
    }

    pub fn apply(&self, config: &mut ApConfiguration) {
        if let Some(ref ssid) = self.ssid {
            config.ssid = Some(ssid.clone());
        }
        if let Some(ref passphrase) = self.passphrase {
            config.passphrase = Some(passphrase.expose_secret().to_owned());
        }
        if self.clear_bssid {
            config.bssid = None;
        } else if self.bssid.is_some() {
            config.bssid = self.bssid;
        }
        if let Some(security) = self.security {
            config.security_type = security;
        }
        if self.band.is_some() || self.channel.is_some() {
            let (current_band, current_channel) = config
                .channels
                .iter()
                .next()
                .map_or((Band::LEGACY, 0), |(band, channel)| (*band, *channel));
            // A band change without a channel drops a channel the new band lacks.
            let channel = self.channel.unwrap_or_else(|| match self.band {
                Some(band)
                    if !Band::for_channel(current_channel).is_some_and(|b| band.contains(b)) =>
                {
                    0
                }
                _ => current_channel,
            });
            let band = self
                .band
                .or_else(|| Band::for_channel(channel))
                .unwrap_or(current_band);
            config.set_channel(channel, band);
        }
        if let Some(enabled) = self.auto_shutdown {
            config.auto_shutdown_enabled = enabled;
        }
        if let Some(timeout) = self.shutdown_timeout {
            config.shutdown_timeout_millis = timeout;
        }
        if self.clear_vendor_elements {
            config.vendor_elements.clear();
        }
        config
            .vendor_elements
            .extend(self.vendor_elements.iter().cloned());
    }
}

pub(crate) fn validate_passphrase(passphrase: &str) -> Result<(), CliError> {
    repeater_core::validate_passphrase(passphrase)
        .map_err(|e| invalid("passphrase", e.to_string()))
}

/// Edit surface that applies [`ConfigEdits`] without user interaction.
///
/// Refuses credential edits on a read-only configuration instead of
/// silently dropping them.
pub struct FlagSurface {
    edits: ConfigEdits,
    refused: AtomicBool,
    applied: Mutex<Option<ApConfiguration>>,
}

impl FlagSurface {
    pub fn new(edits: ConfigEdits) -> Self {
        Self {
            edits,
            refused: AtomicBool::new(false),
            applied: Mutex::new(None),
        }
    }

    pub fn refused(&self) -> bool {
        self.refused.load(Ordering::Acquire)
    }

    pub fn applied(&self) -> Option<ApConfiguration> {
        self.applied
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |a| a.clone())
    }
}

impl EditSurface for FlagSurface {
    async fn edit(&self, mut config: ApConfiguration, read_only: bool) -> Option<ApConfiguration> {
        if read_only && self.edits.touches_credentials() {
            self.refused.store(true, Ordering::Release);
            return None;
        }
        self.edits.apply(&mut config);
        match self.applied.lock() {
            Ok(mut applied) => *applied = Some(config.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(config.clone()),
        }
        Some(config)
    }
}

pub async fn handle(ctx: &Context, args: SetArgs) -> Result<(), CliError> {
    if args.is_empty() {
        return Err(invalid("set", "no changes requested"));
    }
    let surface = FlagSurface::new(ConfigEdits::from_args(args)?);
    let session = ctx.connect().await;

    let (_lifecycle_tx, lifecycle) = watch::channel(LifecycleState::Started);
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    let outcome = session.manager.configure(&surface, lifecycle, &cancel).await;
    interrupt.abort();

    let failures = session.notifier.take();
    let requests = session
        .binder
        .as_ref()
        .map(|b| b.requests())
        .unwrap_or_default();
    session.close().await;

    match outcome.map_err(|e| ctx.core_error(e))? {
        ConfigureOutcome::Applied { read_only } => {
            if let Some(message) = failures.into_iter().next() {
                return Err(CliError::ApplyFailed { message });
            }
            let Some(applied) = surface.applied() else {
                return Err(CliError::Output("edited configuration went missing".into()));
            };
            if requests.contains(&ServiceRequest::InvalidateGroup) {
                refresh_group(ctx, &applied)?;
            }
            info!(read_only, "repeater configuration applied");
            let view = ConfigView::new(&applied, ctx.config.settings.safe_mode, read_only, false);
            let rendered = output::render_single(
                ctx.format,
                &view,
                |_| "Configuration applied".into(),
                |v| v.ssid.clone().unwrap_or_default(),
            )?;
            ctx.print(&rendered);
            Ok(())
        }
        ConfigureOutcome::Dismissed if surface.refused() => Err(CliError::ReadOnly),
        ConfigureOutcome::Dismissed | ConfigureOutcome::Cancelled => Err(CliError::Cancelled),
        ConfigureOutcome::Busy => Err(CliError::Busy),
        ConfigureOutcome::Unavailable => Err(ctx.unavailable()),
    }
}

/// Mirror rewritten credentials into `[group]`, the way the service would
/// re-read its group after an invalidation.
fn refresh_group(ctx: &Context, applied: &ApConfiguration) -> Result<(), CliError> {
    debug!(path = %ctx.path.display(), "refreshing captured group");
    update_group(&ctx.path, |group| {
        if let Some(name) = applied.ssid.as_ref().and_then(Ssid::decode) {
            group.network_name = name;
        }
        if group.passphrase.is_some() {
            group.passphrase.clone_from(&applied.passphrase);
        }
        if applied.bssid.is_some() {
            group.owner_address = applied.bssid;
        }
    })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn parse(args: &[&str]) -> ConfigEdits {
        let mut argv = vec!["repeater", "set"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Set(args) => ConfigEdits::from_args(args).unwrap(),
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn resolved() -> ApConfiguration {
        let mut config = ApConfiguration {
            ssid: Some(Ssid::from_utf8_text("DIRECT-rp-Repeater")),
            passphrase: Some("supplicant-pass".into()),
            ..ApConfiguration::default()
        };
        config.set_channel(6, Band::GHZ_2);
        config
    }

    #[test]
    fn channel_alone_infers_band() {
        let mut config = resolved();
        parse(&["--channel", "36"]).apply(&mut config);
        assert_eq!(config.require_single_band().unwrap(), (Band::GHZ_5, 36));
    }

    #[test]
    fn band_alone_resets_foreign_channel() {
        let mut config = resolved();
        parse(&["--band", "5"]).apply(&mut config);
        assert_eq!(config.require_single_band().unwrap(), (Band::GHZ_5, 0));

        let mut config = resolved();
        parse(&["--band", "2.4"]).apply(&mut config);
        assert_eq!(config.require_single_band().unwrap(), (Band::GHZ_2, 6));
    }

    #[test]
    fn six_ghz_channel_needs_band() {
        let mut argv = vec!["repeater", "set", "--channel", "197"];
        let Command::Set(args) = Cli::try_parse_from(argv.clone()).unwrap().command else {
            panic!("expected set");
        };
        assert!(ConfigEdits::from_args(args).is_err());

        argv.extend_from_slice(&["--band", "6"]);
        let Command::Set(args) = Cli::try_parse_from(argv.clone()).unwrap().command else {
            panic!("expected set");
        };
        let mut config = resolved();
        ConfigEdits::from_args(args).unwrap().apply(&mut config);
        assert_eq!(config.require_single_band().unwrap(), (Band::GHZ_6, 197));
    }

    #[test]
    fn short_passphrase_is_rejected() {
        let Command::Set(args) = Cli::try_parse_from(["repeater", "set", "--passphrase", "short"])
            .unwrap()
            .command
        else {
            panic!("expected set");
        };
        assert!(matches!(
            ConfigEdits::from_args(args),
            Err(CliError::Validation { ref field, .. }) if field == "passphrase"
        ));
    }

    #[test]
    fn vendor_elements_accumulate_unless_cleared() {
        let mut config = resolved();
        config.vendor_elements.insert(VendorElement::new(vec![0xdd, 0x01]));
        parse(&["--vendor-element", "dd0203"]).apply(&mut config);
        assert_eq!(config.vendor_elements.len(), 2);

        parse(&["--clear-vendor-elements", "--vendor-element", "dd0405"]).apply(&mut config);
        assert_eq!(
            config.vendor_elements.into_iter().collect::<Vec<_>>(),
            vec![VendorElement::new(vec![0xdd, 0x04, 0x05])]
        );
    }

    #[tokio::test]
    async fn read_only_surface_refuses_credentials() {
        let surface = FlagSurface::new(parse(&["--ssid", "DIRECT-rp-Attic"]));
        assert!(surface.edit(resolved(), true).await.is_none());
        assert!(surface.refused());
        assert!(surface.applied().is_none());
    }

    #[tokio::test]
    async fn read_only_surface_applies_other_edits() {
        let surface = FlagSurface::new(parse(&["--auto-shutdown", "false"]));
        let edited = surface.edit(resolved(), true).await.unwrap();
        assert!(!edited.auto_shutdown_enabled);
        assert!(!surface.refused());
        assert_eq!(surface.applied(), Some(edited));
    }

    #[test]
    fn clear_bssid_drops_it() {
        let mut config = resolved();
        config.bssid = Some(MacAddress::parse("02:11:22:33:44:55").unwrap());
        parse(&["--clear-bssid"]).apply(&mut config);
        assert!(config.bssid.is_none());
    }
}
