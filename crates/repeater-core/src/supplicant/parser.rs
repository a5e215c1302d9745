// ── p2p_supplicant.conf parsing ──
//
// Only the pieces the bridge needs are interpreted: the persistent device
// address and, per `network={}` block, ssid/psk/bssid/mode. Every other
// line is carried through a rewrite byte-for-byte.

use crate::model::{MacAddress, Ssid};

use super::BridgeError;

pub(crate) const PERSISTENT_MAC: &str = "p2p_device_persistent_mac_addr=";
const GROUP_OWNER_MODE: &str = "3";

#[derive(Debug, Clone, Default)]
pub(crate) struct NetworkBlock {
    ssid_line: Option<usize>,
    /// `None` when the line is missing or uses an encoding we do not read.
    ssid: Option<Ssid>,
    psk_line: Option<usize>,
    psk: Option<String>,
    bssid_line: Option<usize>,
    bssid: Option<MacAddress>,
    group_owner: bool,
}

impl NetworkBlock {
    /// The quoted passphrase of this block.
    pub(crate) fn passphrase(&self) -> Result<String, BridgeError> {
        let raw = self.psk.as_deref().ok_or_else(|| BridgeError::ParseFailure {
            reason: "persistent group has no psk".into(),
        })?;
        raw.strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .map(str::to_owned)
            .ok_or_else(|| BridgeError::ParseFailure {
                reason: "persistent group stores a raw PSK instead of a passphrase".into(),
            })
    }

    pub(crate) fn bssid(&self) -> Option<MacAddress> {
        self.bssid
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedConfig {
    lines: Vec<String>,
    trailing_newline: bool,
    persistent_mac_line: Option<usize>,
    persistent_mac: Option<MacAddress>,
    blocks: Vec<NetworkBlock>,
}

fn parse_failure(line: usize, reason: impl Into<String>) -> BridgeError {
    BridgeError::ParseFailure {
        reason: format!("line {}: {}", line + 1, reason.into()),
    }
}

impl ParsedConfig {
    pub(crate) fn parse(contents: &str) -> Result<Self, BridgeError> {
        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        let mut persistent_mac_line = None;
        let mut persistent_mac = None;
        let mut blocks = Vec::new();
        let mut current: Option<NetworkBlock> = None;

        for (idx, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if current.is_none() {
                if let Some(value) = line.strip_prefix(PERSISTENT_MAC) {
                    persistent_mac_line = Some(idx);
                    persistent_mac = Some(
                        MacAddress::parse(value)
                            .map_err(|e| parse_failure(idx, e.to_string()))?,
                    );
                } else if line == "network={" {
                    current = Some(NetworkBlock::default());
                }
                continue;
            }
            if line == "}" {
                blocks.extend(current.take());
                continue;
            }
            let Some(block) = current.as_mut() else {
                continue;
            };
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_failure(idx, format!("unexpected {line:?}")));
            };
            match key {
                "ssid" => {
                    block.ssid_line = Some(idx);
                    block.ssid = Ssid::from_supplicant(value).ok();
                }
                "psk" => {
                    block.psk_line = Some(idx);
                    block.psk = Some(value.to_owned());
                }
                "bssid" => {
                    block.bssid_line = Some(idx);
                    block.bssid = Some(
                        MacAddress::parse(value).map_err(|e| parse_failure(idx, e.to_string()))?,
                    );
                }
                "mode" => block.group_owner = value == GROUP_OWNER_MODE,
                _ => {}
            }
        }
        if current.is_some() {
            return Err(BridgeError::ParseFailure {
                reason: "unterminated network block".into(),
            });
        }

        Ok(Self {
            lines,
            trailing_newline: contents.ends_with('\n'),
            persistent_mac_line,
            persistent_mac,
            blocks,
        })
    }

    pub(crate) fn persistent_mac(&self) -> Option<MacAddress> {
        self.persistent_mac
    }

    pub(crate) fn block(&self, index: usize) -> Option<&NetworkBlock> {
        self.blocks.get(index)
    }

    pub(crate) fn same_contents(&self, other: &Self) -> bool {
        self.lines == other.lines
    }

    /// Locate the persistent group-owner block for `network_name`.
    ///
    /// When several blocks carry the name, the one whose bssid equals the
    /// device address wins.
    pub(crate) fn find_group(
        &self,
        network_name: &str,
        device_address: Option<MacAddress>,
    ) -> Result<usize, BridgeError> {
        let wanted = Ssid::from_utf8_text(network_name);
        let candidates: Vec<usize> = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.group_owner && b.ssid.as_ref() == Some(&wanted))
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [] => Err(BridgeError::ParseFailure {
                reason: format!("no persistent group named {network_name:?}"),
            }),
            [only] => Ok(*only),
            many => {
                let by_address: Vec<usize> = many
                    .iter()
                    .copied()
                    .filter(|i| {
                        device_address.is_some()
                            && self.blocks.get(*i).and_then(NetworkBlock::bssid) == device_address
                    })
                    .collect();
                match by_address.as_slice() {
                    [only] => Ok(*only),
                    _ => Err(BridgeError::ParseFailure {
                        reason: format!(
                            "{} persistent groups named {network_name:?}",
                            many.len()
                        ),
                    }),
                }
            }
        }
    }

    /// Render the configuration with one block's credentials replaced.
    pub(crate) fn rewrite(
        &self,
        index: usize,
        ssid: &Ssid,
        passphrase: &str,
        bssid: Option<MacAddress>,
    ) -> Result<String, BridgeError> {
        let block = self.blocks.get(index).ok_or_else(|| BridgeError::ParseFailure {
            reason: format!("network block {index} does not exist"),
        })?;
        let ssid_line = block.ssid_line.ok_or_else(|| BridgeError::ParseFailure {
            reason: "persistent group has no ssid line".into(),
        })?;
        let indent: String = self
            .lines
            .get(ssid_line)
            .map(|l| l.chars().take_while(|c| c.is_whitespace()).collect())
            .unwrap_or_default();
        let psk_entry = format!("{indent}psk=\"{passphrase}\"");

        let mut out = Vec::with_capacity(self.lines.len() + 2);
        for (idx, line) in self.lines.iter().enumerate() {
            if Some(idx) == self.persistent_mac_line {
                // Cleared together with the block bssid.
                if let Some(mac) = bssid {
                    out.push(format!("{PERSISTENT_MAC}{mac}"));
                }
            } else if idx == ssid_line {
                out.push(format!("{indent}ssid={}", ssid.to_supplicant()));
                if block.psk_line.is_none() {
                    out.push(psk_entry.clone());
                }
                if let (None, Some(mac)) = (block.bssid_line, bssid) {
                    out.push(format!("{indent}bssid={mac}"));
                }
            } else if Some(idx) == block.psk_line {
                out.push(psk_entry.clone());
            } else if Some(idx) == block.bssid_line {
                if let Some(mac) = bssid {
                    out.push(format!("{indent}bssid={mac}"));
                }
            } else {
                out.push(line.clone());
            }
        }

        let mut rendered = out.join("\n");
        if self.trailing_newline {
            rendered.push('\n');
        }
        Ok(rendered)
    }
}
