// ── Configuration resolution ──
//
// Derives the editable AP configuration either from safe-mode settings or
// from the live group plus whatever the supplicant bridge can add.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::RepeaterBinder;
use crate::capability::{Capability, PlatformCapabilities};
use crate::error::CoreError;
use crate::model::{ApConfiguration, Band, GroupSnapshot, MacRandomization, SecurityType, Ssid};
use crate::settings::{RepeaterSettings, SettingsStore};
use crate::supplicant::{SupplicantChannel, SupplicantConfiguration};

/// A resolved configuration and the bridge handle that produced it.
///
/// When `read_only` is set the credential fields are best-effort values
/// reported by the platform and must not be offered for editing.
#[derive(Debug)]
pub struct Resolution<C> {
    pub config: ApConfiguration,
    pub read_only: bool,
    /// Handed to the reconciler and consumed there.
    pub bridge: Option<SupplicantConfiguration<C>>,
}

pub struct ConfigurationResolver<'a, B, C> {
    settings: &'a dyn SettingsStore,
    caps: &'a PlatformCapabilities,
    binder: Option<&'a B>,
    channel: &'a Arc<C>,
}

impl<'a, B: RepeaterBinder, C: SupplicantChannel> ConfigurationResolver<'a, B, C> {
    pub fn new(
        settings: &'a dyn SettingsStore,
        caps: &'a PlatformCapabilities,
        binder: Option<&'a B>,
        channel: &'a Arc<C>,
    ) -> Self {
        Self {
            settings,
            caps,
            binder,
            channel,
        }
    }

    /// Resolve the configuration to edit.
    ///
    /// Fails with [`CoreError::ConfigurationUnavailable`] when safe mode is
    /// missing its credentials or no live group can be obtained, and with
    /// [`CoreError::Cancelled`] when the user aborts the device address
    /// prompt. Every other bridge failure degrades to a read-only result.
    pub async fn resolve(&self) -> Result<Resolution<C>, CoreError> {
        let settings = self.settings.load();
        if settings.safe_mode {
            return self.resolve_safe_mode(&settings);
        }
        let binder = self.binder.ok_or(CoreError::ConfigurationUnavailable)?;
        let group = match binder.current_group() {
            Some(group) => group,
            None => {
                debug!("no live group, fetching persistent group");
                binder.fetch_persistent_group().await;
                binder
                    .current_group()
                    .ok_or(CoreError::ConfigurationUnavailable)?
            }
        };
        self.resolve_live(binder, &settings, group).await
    }

    fn resolve_safe_mode(
        &self,
        settings: &RepeaterSettings,
    ) -> Result<Resolution<C>, CoreError> {
        let (Some(ssid), Some(passphrase)) = (&settings.network_name, &settings.passphrase) else {
            debug!("safe mode is missing network name or passphrase");
            return Err(CoreError::ConfigurationUnavailable);
        };
        let mut config = self.base_config(settings);
        config.ssid = Some(ssid.clone());
        config.passphrase = Some(passphrase.clone());
        config.security_type = settings.security_type;
        config.bssid = settings.device_address;
        config.set_channel(settings.operating_channel, settings.operating_band);
        Ok(Resolution {
            config,
            read_only: false,
            bridge: None,
        })
    }

    async fn resolve_live(
        &self,
        binder: &B,
        settings: &RepeaterSettings,
        group: GroupSnapshot,
    ) -> Result<Resolution<C>, CoreError> {
        let mut config = self.base_config(settings);
        config.ssid = Some(Ssid::from_utf8_text(&group.network_name));
        config.security_type = if self.caps.has(Capability::Wpa3GroupSecurity) {
            group.security_type
        } else {
            SecurityType::Wpa2Psk
        };
        let channel = settings.operating_channel;
        config.set_channel(
            channel,
            Band::for_channel(channel).unwrap_or(settings.operating_band),
        );

        let device_address = binder
            .obtain_device_address()
            .await
            .map_err(|_| CoreError::Cancelled)?;

        match SupplicantConfiguration::open(Arc::clone(self.channel), &group, device_address).await
        {
            Ok(bridge) => {
                config.passphrase = Some(bridge.passphrase().to_owned());
                config.bssid = bridge.bssid();
                Ok(Resolution {
                    config,
                    read_only: false,
                    bridge: Some(bridge),
                })
            }
            Err(e) => {
                let e = CoreError::from(e);
                if e.is_cancelled() {
                    return Err(CoreError::Cancelled);
                }
                warn!(
                    error = %e,
                    network = %group.network_name,
                    "falling back to reported group credentials"
                );
                config.passphrase = group.passphrase;
                config.bssid = group.owner_address;
                Ok(Resolution {
                    config,
                    read_only: true,
                    bridge: None,
                })
            }
        }
    }

    /// Fields taken from settings regardless of mode.
    fn base_config(&self, settings: &RepeaterSettings) -> ApConfiguration {
        ApConfiguration {
            auto_shutdown_enabled: settings.auto_shutdown_enabled,
            shutdown_timeout_millis: settings.shutdown_timeout_millis,
            mac_randomization: MacRandomization::for_support(
                self.caps.has(Capability::P2pMacRandomization),
            ),
            vendor_elements: settings.vendor_elements.clone(),
            ..ApConfiguration::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::binder::{Cancelled, ServiceStatus};
    use crate::model::{MacAddress, VendorElement};
    use crate::settings::MemorySettings;
    use crate::testing::{FakeBinder, GROUP_CONF, MemoryChannel, capture_warnings, group};

    fn safe_mode_settings() -> RepeaterSettings {
        RepeaterSettings {
            safe_mode: true,
            network_name: Some(Ssid::from_utf8_text("Home")),
            passphrase: Some("secret123".into()),
            security_type: SecurityType::Wpa2Psk,
            ..RepeaterSettings::default()
        }
    }

    async fn resolve_with(
        settings: RepeaterSettings,
        caps: &PlatformCapabilities,
        binder: Option<&FakeBinder>,
        channel: &Arc<MemoryChannel>,
    ) -> Result<Resolution<MemoryChannel>, CoreError> {
        let store = MemorySettings::new(settings);
        ConfigurationResolver::new(&store, caps, binder, channel)
            .resolve()
            .await
    }

    #[tokio::test]
    async fn safe_mode_builds_from_settings() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::default());
        let resolution = resolve_with(safe_mode_settings(), &caps, None, &channel)
            .await
            .unwrap();
        assert!(!resolution.read_only);
        assert!(resolution.bridge.is_none());
        assert_eq!(resolution.config.ssid, Some(Ssid::from_utf8_text("Home")));
        assert_eq!(resolution.config.passphrase.as_deref(), Some("secret123"));
        assert_eq!(resolution.config.security_type, SecurityType::Wpa2Psk);
        assert_eq!(resolution.config.require_single_band().unwrap(), (Band::LEGACY, 0));
    }

    #[tokio::test]
    async fn safe_mode_resolution_is_stable() {
        let caps = PlatformCapabilities::none().with(Capability::P2pMacRandomization, true);
        let channel = Arc::new(MemoryChannel::default());
        let mut settings = safe_mode_settings();
        settings.device_address = Some(MacAddress::parse("02:00:00:00:00:01").unwrap());
        settings.operating_band = Band::GHZ_5;
        settings.operating_channel = 36;
        settings.vendor_elements.insert(VendorElement::new(vec![0xdd, 0x01, 0x02]));
        let store = MemorySettings::new(settings);
        let resolver = ConfigurationResolver::<FakeBinder, _>::new(&store, &caps, None, &channel);

        let first = resolver.resolve().await.unwrap();
        let second = resolver.resolve().await.unwrap();
        assert_eq!(first.config, second.config);
        assert!(!first.read_only && !second.read_only);
        assert_eq!(first.config.mac_randomization, MacRandomization::NonPersistent);
        assert_eq!(first.config.require_single_band().unwrap(), (Band::GHZ_5, 36));
    }

    #[tokio::test]
    async fn safe_mode_without_passphrase_is_unavailable() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let mut settings = safe_mode_settings();
        settings.passphrase = None;
        // A live group is present but must not be consulted.
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let err = resolve_with(settings, &caps, Some(&binder), &channel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationUnavailable));
    }

    #[tokio::test]
    async fn live_group_reads_credentials_from_supplicant() {
        let caps = PlatformCapabilities::for_api_level(36);
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let resolution = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert!(!resolution.read_only);
        assert!(resolution.bridge.is_some());
        assert_eq!(resolution.config.passphrase.as_deref(), Some("supplicant-pass"));
        assert_eq!(
            resolution.config.bssid,
            Some(MacAddress::parse("02:11:22:33:44:55").unwrap())
        );
        assert_eq!(resolution.config.security_type, SecurityType::Wpa3SaeTransition);
    }

    #[tokio::test]
    async fn security_type_is_pinned_on_older_platforms() {
        let caps = PlatformCapabilities::for_api_level(33);
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let resolution = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert_eq!(resolution.config.security_type, SecurityType::Wpa2Psk);
    }

    #[tokio::test]
    async fn live_channel_band_follows_channel_number() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let settings = RepeaterSettings {
            operating_band: Band::LEGACY,
            operating_channel: 149,
            ..RepeaterSettings::default()
        };
        let resolution = resolve_with(settings, &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert_eq!(resolution.config.require_single_band().unwrap(), (Band::GHZ_5, 149));
    }

    #[tokio::test]
    async fn persistent_group_is_fetched_once() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Idle, None);
        *binder.persistent.lock().unwrap() = Some(group());
        let resolution = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert_eq!(binder.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolution.config.ssid, Some(Ssid::from_utf8_text("DIRECT-rp-Repeater")));
    }

    #[tokio::test]
    async fn no_group_is_unavailable() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Idle, None);
        let err = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationUnavailable));
        assert_eq!(binder.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_binder_is_unavailable() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let err = resolve_with(RepeaterSettings::default(), &caps, None, &channel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationUnavailable));
    }

    #[tokio::test]
    async fn unavailable_bridge_falls_back_to_reported_values() {
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::default());
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let resolution = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert!(resolution.read_only);
        assert!(resolution.bridge.is_none());
        assert_eq!(resolution.config.passphrase, group().passphrase);
        assert_eq!(resolution.config.bssid, group().owner_address);
    }

    #[tokio::test]
    async fn parse_failure_warns_once() {
        let (warnings, _guard) = capture_warnings();
        let caps = PlatformCapabilities::none();
        // Raw hex PSK cannot be surfaced as a passphrase.
        let conf = "network={\n\tssid=\"DIRECT-rp-Repeater\"\n\tpsk=0123456789abcdef\n\tmode=3\n}\n";
        let channel = Arc::new(MemoryChannel::with(conf));
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        let resolution = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap();
        assert!(resolution.read_only);
        assert_eq!(resolution.config.passphrase.as_deref(), Some("system-pass"));
        assert_eq!(resolution.config.bssid, group().owner_address);
        assert_eq!(warnings.count(), 1);
    }

    #[tokio::test]
    async fn cancelled_device_address_is_silent() {
        let (warnings, _guard) = capture_warnings();
        let caps = PlatformCapabilities::none();
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let binder = FakeBinder::new(ServiceStatus::Active, Some(group()));
        *binder.device_address.lock().unwrap() = Err(Cancelled);
        let err = resolve_with(RepeaterSettings::default(), &caps, Some(&binder), &channel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(warnings.count(), 0);
    }
}
