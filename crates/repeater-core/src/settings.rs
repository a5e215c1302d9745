// ── Repeater settings ──
//
// The only state that survives without a live group. Persistence is
// owned by the embedding application; core reads a snapshot and writes
// whole snapshots back.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Band, MacAddress, SecurityType, Ssid, VendorElement};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeaterSettings {
    pub safe_mode: bool,
    pub network_name: Option<Ssid>,
    pub passphrase: Option<String>,
    pub security_type: SecurityType,
    pub device_address: Option<MacAddress>,
    pub operating_band: Band,
    pub operating_channel: u16,
    pub auto_shutdown_enabled: bool,
    pub shutdown_timeout_millis: u64,
    pub vendor_elements: BTreeSet<VendorElement>,
}

impl Default for RepeaterSettings {
    fn default() -> Self {
        Self {
            safe_mode: false,
            network_name: None,
            passphrase: None,
            security_type: SecurityType::Wpa2Psk,
            device_address: None,
            operating_band: Band::LEGACY,
            operating_channel: 0,
            auto_shutdown_enabled: true,
            shutdown_timeout_millis: 0,
            vendor_elements: BTreeSet::new(),
        }
    }
}

/// Process-wide key-value settings storage.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> RepeaterSettings;

    fn store(&self, settings: &RepeaterSettings) -> Result<(), CoreError>;

    /// Load, apply `f`, store.
    fn modify(&self, f: &mut dyn FnMut(&mut RepeaterSettings)) -> Result<(), CoreError> {
        let mut settings = self.load();
        f(&mut settings);
        self.store(&settings)
    }
}

/// In-memory store, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySettings {
    inner: Mutex<RepeaterSettings>,
}

impl MemorySettings {
    pub fn new(settings: RepeaterSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> RepeaterSettings {
        self.inner
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |s| s.clone())
    }

    fn store(&self, settings: &RepeaterSettings) -> Result<(), CoreError> {
        let mut guard = self.inner.lock().map_err(|_| CoreError::Settings {
            message: "settings lock poisoned".into(),
        })?;
        *guard = settings.clone();
        Ok(())
    }
}
