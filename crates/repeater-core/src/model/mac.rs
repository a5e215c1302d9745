// ── Hardware address ──
//
// Every BSSID, owner address and device address in the crate flows
// through this type. Parsing is strict: supplicant output and settings
// values that do not hold six octets are rejected, never guessed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MAC address: {input:?}")]
pub struct MacParseError {
    pub input: String,
}

/// MAC address, displayed in lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MacParseError> {
        let raw = raw.as_ref();
        let err = || MacParseError {
            input: raw.to_owned(),
        };
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect();
        if compact.len() != 12 {
            return Err(err());
        }
        let mut bytes = [0u8; 6];
        hex::decode_to_slice(&compact, &mut bytes).map_err(|_| err())?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
