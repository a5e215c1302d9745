// ── Wi-Fi Direct group snapshot ──

use serde::{Deserialize, Serialize};

use super::ap::SecurityType;
use super::channel::frequency_to_channel;
use super::mac::MacAddress;

/// Read-only view of a Wi-Fi Direct group as reported by the platform.
///
/// Captured fresh for every resolution attempt and never mutated; a
/// group change produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub network_name: String,
    /// Only present when the platform reports it.
    pub passphrase: Option<String>,
    pub owner_address: Option<MacAddress>,
    pub security_type: SecurityType,
    /// Operating frequency in MHz, 0 if unknown.
    pub frequency_mhz: u32,
    pub interface_name: String,
    /// Interface hardware address from the optional introspection channel.
    #[serde(default)]
    pub interface_address: Option<MacAddress>,
}

impl GroupSnapshot {
    /// Operating channel, if the frequency is known and on the channel plan.
    pub fn channel(&self) -> Option<u16> {
        match self.frequency_mhz {
            0 => None,
            mhz => frequency_to_channel(mhz),
        }
    }
}
