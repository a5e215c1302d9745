// ── Configuration reconciliation ──
//
// Applies an edited configuration: credentials go to settings (safe mode)
// or to the supplicant (live mode), and the cross-cutting settings are
// persisted either way.

use tracing::{debug, warn};

use crate::binder::{Notifier, RepeaterBinder};
use crate::error::CoreError;
use crate::model::{ApConfiguration, Ssid};
use crate::settings::{RepeaterSettings, SettingsStore};
use crate::supplicant::{SupplicantChannel, SupplicantConfiguration};

pub struct ConfigurationReconciler<'a, B> {
    settings: &'a dyn SettingsStore,
    notifier: &'a dyn Notifier,
    binder: Option<&'a B>,
}

impl<'a, B: RepeaterBinder> ConfigurationReconciler<'a, B> {
    pub fn new(
        settings: &'a dyn SettingsStore,
        notifier: &'a dyn Notifier,
        binder: Option<&'a B>,
    ) -> Self {
        Self {
            settings,
            notifier,
            binder,
        }
    }

    /// Apply `edited`, consuming the bridge handle from the resolution.
    ///
    /// Only a multi-band or empty channel map is returned as an error, and
    /// it is returned before anything is touched. Everything else is
    /// logged and notified.
    pub async fn reconcile<C: SupplicantChannel>(
        &self,
        edited: ApConfiguration,
        bridge: Option<SupplicantConfiguration<C>>,
    ) -> Result<(), CoreError> {
        let (band, channel) = edited.require_single_band()?;

        if self.settings.load().safe_mode {
            let ssid = edited.ssid.clone();
            let passphrase = edited.passphrase.clone();
            let security_type = edited.security_type;
            let device_address = edited.bssid;
            self.persist(&mut |s: &mut RepeaterSettings| {
                s.network_name.clone_from(&ssid);
                s.device_address = device_address;
                s.passphrase.clone_from(&passphrase);
                s.security_type = security_type;
            });
        } else if let Some(bridge) = bridge {
            self.push_to_group(&edited, bridge).await;
        }

        let ApConfiguration {
            auto_shutdown_enabled,
            shutdown_timeout_millis,
            vendor_elements,
            ..
        } = edited;
        self.persist(&mut |s: &mut RepeaterSettings| {
            s.operating_band = band;
            s.operating_channel = channel;
            s.auto_shutdown_enabled = auto_shutdown_enabled;
            s.shutdown_timeout_millis = shutdown_timeout_millis;
            s.vendor_elements.clone_from(&vendor_elements);
        });
        Ok(())
    }

    async fn push_to_group<C: SupplicantChannel>(
        &self,
        edited: &ApConfiguration,
        bridge: SupplicantConfiguration<C>,
    ) {
        let live_name = self.binder.and_then(|b| b.current_group()).map(|g| g.network_name);
        let may_be_modified = Some(bridge.passphrase()) != edited.passphrase.as_deref()
            || bridge.bssid() != edited.bssid
            || ssid_differs(edited.ssid.as_ref(), live_name.as_deref());
        if !may_be_modified {
            debug!("credentials unchanged, leaving supplicant configuration alone");
            return;
        }

        let (Some(ssid), Some(passphrase)) = (edited.ssid.clone(), edited.passphrase.clone())
        else {
            self.fail(&CoreError::ValidationFailed {
                message: "network name and passphrase are required".into(),
            });
            return;
        };
        let bssid = edited.bssid;
        let update =
            tokio::spawn(async move { bridge.update(&ssid, &passphrase, bssid).await });
        match update.await {
            Ok(Ok(())) => {
                if let Some(binder) = self.binder {
                    binder.invalidate_group();
                }
            }
            Ok(Err(e)) => self.fail(&e.into()),
            Err(e) => self.fail(&CoreError::Internal(format!("supplicant update task: {e}"))),
        }
    }

    fn persist(&self, f: &mut dyn FnMut(&mut RepeaterSettings)) {
        if let Err(e) = self.settings.modify(f) {
            self.fail(&e);
        }
    }

    fn fail(&self, e: &CoreError) {
        if e.is_cancelled() {
            return;
        }
        warn!(error = %e, "failed to apply repeater configuration");
        self.notifier.notify(&e.to_string());
    }
}

/// Whether the edited SSID names a different network than the live group.
///
/// An SSID that does not decode as UTF-8 counts as no name at all.
fn ssid_differs(edited: Option<&Ssid>, live_name: Option<&str>) -> bool {
    edited.and_then(Ssid::decode).as_deref() != live_name
}
