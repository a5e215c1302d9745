// ── Access point configuration ──
//
// `ApConfiguration` is produced by resolution, optionally edited by the
// caller, and consumed by reconciliation exactly once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use super::channel::Band;
use super::mac::MacAddress;
use super::ssid::Ssid;
use crate::error::CoreError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SecurityType {
    #[default]
    Wpa2Psk,
    Wpa3Sae,
    Wpa3SaeTransition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MacRandomization {
    #[default]
    None,
    NonPersistent,
}

impl MacRandomization {
    /// Never advertise randomization the platform cannot honor.
    pub fn for_support(supported: bool) -> Self {
        if supported {
            Self::NonPersistent
        } else {
            Self::None
        }
    }
}

/// Opaque vendor-specific information element attached to beacons and
/// probe responses. Stored as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VendorElement(Vec<u8>);

impl VendorElement {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(raw: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(raw.trim()).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for VendorElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for VendorElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VendorElement({self})")
    }
}

impl Serialize for VendorElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VendorElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// The canonical soft-AP configuration of a repeater group.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApConfiguration {
    pub ssid: Option<Ssid>,
    pub passphrase: Option<String>,
    pub bssid: Option<MacAddress>,
    pub security_type: SecurityType,
    /// Band → channel. Must hold exactly one entry when reconciled.
    pub channels: BTreeMap<Band, u16>,
    pub auto_shutdown_enabled: bool,
    /// 0 selects the platform default timeout.
    pub shutdown_timeout_millis: u64,
    pub mac_randomization: MacRandomization,
    pub vendor_elements: BTreeSet<VendorElement>,
}

impl Default for ApConfiguration {
    fn default() -> Self {
        Self {
            ssid: None,
            passphrase: None,
            bssid: None,
            security_type: SecurityType::default(),
            channels: BTreeMap::from([(Band::LEGACY, 0)]),
            auto_shutdown_enabled: true,
            shutdown_timeout_millis: 0,
            mac_randomization: MacRandomization::default(),
            vendor_elements: BTreeSet::new(),
        }
    }
}

impl ApConfiguration {
    /// Replace the channel map with a single band/channel pair.
    pub fn set_channel(&mut self, channel: u16, band: Band) {
        self.channels = BTreeMap::from([(band, channel)]);
    }

    /// The single (band, channel) pair this configuration operates on.
    pub fn require_single_band(&self) -> Result<(Band, u16), CoreError> {
        let mut entries = self.channels.iter();
        match (entries.next(), entries.next()) {
            (Some((band, channel)), None) => Ok((*band, *channel)),
            _ => Err(CoreError::PreconditionViolation {
                message: format!(
                    "expected exactly one band/channel pair, got {}",
                    self.channels.len()
                ),
            }),
        }
    }
}

impl fmt::Debug for ApConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApConfiguration")
            .field("ssid", &self.ssid)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "****"))
            .field("bssid", &self.bssid)
            .field("security_type", &self.security_type)
            .field("channels", &self.channels)
            .field("auto_shutdown_enabled", &self.auto_shutdown_enabled)
            .field("shutdown_timeout_millis", &self.shutdown_timeout_millis)
            .field("mac_randomization", &self.mac_randomization)
            .field("vendor_elements", &self.vendor_elements)
            .finish()
    }
}
