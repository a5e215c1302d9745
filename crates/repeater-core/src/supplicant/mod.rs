// ── Supplicant configuration bridge ──
//
// The platform's group object never exposes the persistent group's
// passphrase or the device address the supplicant actually uses. Both
// live in the P2P supplicant configuration, reachable only through a
// privileged channel. This module reads them out and writes edits back.

mod file;
mod parser;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{GroupSnapshot, MacAddress, Ssid, validate_passphrase};

pub use file::{CONF_PATH_LEGACY, CONF_PATH_VENDOR, FileChannel};
use parser::ParsedConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No supplicant access on this build or configuration.
    #[error("supplicant configuration unavailable: {reason}")]
    Unavailable { reason: String },

    /// The supplicant configuration did not look as expected.
    #[error("unexpected supplicant configuration: {reason}")]
    ParseFailure { reason: String },

    /// The user aborted an interactive step.
    #[error("cancelled")]
    Cancelled,

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Privileged read/write access to the P2P supplicant configuration.
pub trait SupplicantChannel: Send + Sync + 'static {
    fn read_config(&self) -> impl Future<Output = Result<String, BridgeError>> + Send;

    fn write_config(&self, contents: String)
    -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// An opened view of one persistent group in the supplicant configuration.
///
/// Single use: [`update`](Self::update) consumes the handle, and a new
/// edit cycle must open a fresh one.
pub struct SupplicantConfiguration<C> {
    channel: Arc<C>,
    parsed: ParsedConfig,
    block: usize,
    passphrase: String,
    bssid: Option<MacAddress>,
}

impl<C> fmt::Debug for SupplicantConfiguration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupplicantConfiguration")
            .field("block", &self.block)
            .field("bssid", &self.bssid)
            .finish_non_exhaustive()
    }
}

impl<C: SupplicantChannel> SupplicantConfiguration<C> {
    /// Read the configuration and locate the persistent group for `group`.
    pub async fn open(
        channel: Arc<C>,
        group: &GroupSnapshot,
        device_address: Option<MacAddress>,
    ) -> Result<Self, BridgeError> {
        let contents = channel.read_config().await?;
        let parsed = ParsedConfig::parse(&contents)?;
        let block = parsed.find_group(&group.network_name, device_address)?;
        let entry = parsed.block(block).ok_or_else(|| BridgeError::ParseFailure {
            reason: "network block vanished".into(),
        })?;
        let passphrase = entry.passphrase()?;
        let bssid = parsed
            .persistent_mac()
            .or_else(|| entry.bssid())
            .or(device_address);
        debug!(
            network = %group.network_name,
            bssid = ?bssid,
            "opened persistent group in supplicant configuration"
        );
        Ok(Self {
            channel,
            parsed,
            block,
            passphrase,
            bssid,
        })
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn bssid(&self) -> Option<MacAddress> {
        self.bssid
    }

    /// Rewrite the group's SSID, passphrase and BSSID.
    ///
    /// Fails without writing if the file changed since it was opened.
    pub async fn update(
        self,
        ssid: &Ssid,
        passphrase: &str,
        bssid: Option<MacAddress>,
    ) -> Result<(), BridgeError> {
        validate_passphrase(passphrase).map_err(|e| BridgeError::InvalidValue {
            field: "passphrase".into(),
            reason: e.to_string(),
        })?;
        ssid.validate().map_err(|e| BridgeError::InvalidValue {
            field: "ssid".into(),
            reason: e.to_string(),
        })?;

        let fresh = ParsedConfig::parse(&self.channel.read_config().await?)?;
        if !fresh.same_contents(&self.parsed) {
            return Err(BridgeError::ParseFailure {
                reason: "supplicant configuration changed since it was read".into(),
            });
        }
        let rendered = self.parsed.rewrite(self.block, ssid, passphrase, bssid)?;
        self.channel.write_config(rendered).await?;
        info!(ssid = %ssid, bssid = ?bssid, "persistent group updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{GROUP_CONF, MemoryChannel, group};

    #[tokio::test]
    async fn open_reads_passphrase_and_bssid() {
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let config = SupplicantConfiguration::open(channel, &group(), None)
            .await
            .unwrap();
        assert_eq!(config.passphrase(), "supplicant-pass");
        assert_eq!(config.bssid().unwrap().to_string(), "02:11:22:33:44:55");
    }

    #[tokio::test]
    async fn bssid_falls_back_to_device_address() {
        let conf = "network={\n\tssid=\"DIRECT-rp-Repeater\"\n\tpsk=\"supplicant-pass\"\n\tmode=3\n}\n";
        let channel = Arc::new(MemoryChannel::with(conf));
        let device = MacAddress::parse("02:99:88:77:66:55").unwrap();
        let config = SupplicantConfiguration::open(channel, &group(), Some(device))
            .await
            .unwrap();
        assert_eq!(config.bssid(), Some(device));
    }

    #[tokio::test]
    async fn unavailable_channel_propagates() {
        let channel = Arc::new(MemoryChannel::default());
        let err = SupplicantConfiguration::open(channel, &group(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn update_writes_new_credentials() {
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let config = SupplicantConfiguration::open(Arc::clone(&channel), &group(), None)
            .await
            .unwrap();
        config
            .update(&Ssid::from_utf8_text("DIRECT-rp-Attic"), "attic-passphrase", None)
            .await
            .unwrap();
        let written = channel.contents().unwrap();
        assert!(written.contains("\tssid=\"DIRECT-rp-Attic\""));
        assert!(written.contains("\tpsk=\"attic-passphrase\""));
        assert!(!written.contains("bssid="));
        assert_eq!(channel.writes(), 1);
    }

    #[tokio::test]
    async fn update_rejects_short_passphrase() {
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let config = SupplicantConfiguration::open(Arc::clone(&channel), &group(), None)
            .await
            .unwrap();
        let err = config
            .update(&Ssid::from_utf8_text("DIRECT-rp-Attic"), "short", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidValue { .. }));
        assert_eq!(channel.writes(), 0);
    }

    #[tokio::test]
    async fn update_refuses_concurrent_edits() {
        let channel = Arc::new(MemoryChannel::with(GROUP_CONF));
        let config = SupplicantConfiguration::open(Arc::clone(&channel), &group(), None)
            .await
            .unwrap();
        *channel.contents.lock().unwrap() = Some(format!("{GROUP_CONF}# edited\n"));
        let err = config
            .update(&Ssid::from_utf8_text("DIRECT-rp-Attic"), "attic-passphrase", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ParseFailure { .. }));
        assert_eq!(channel.writes(), 0);
    }

    #[tokio::test]
    async fn cleared_bssid_stays_cleared_after_reopen() {
        let conf = format!("p2p_device_persistent_mac_addr=02:11:22:33:44:55\n{GROUP_CONF}");
        let channel = Arc::new(MemoryChannel::with(&conf));
        let config = SupplicantConfiguration::open(Arc::clone(&channel), &group(), None)
            .await
            .unwrap();
        assert!(config.bssid().is_some());
        config
            .update(&Ssid::from_utf8_text("DIRECT-rp-Repeater"), "supplicant-pass", None)
            .await
            .unwrap();

        let reopened = SupplicantConfiguration::open(channel, &group(), None)
            .await
            .unwrap();
        assert_eq!(reopened.bssid(), None);
        assert_eq!(reopened.passphrase(), "supplicant-pass");
    }
}
