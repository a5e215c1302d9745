// ── SSID ──
//
// SSIDs are byte strings. Platforms hand them around as text, the
// supplicant stores them either quoted or hex-encoded, and nothing
// guarantees they decode as UTF-8.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MAX_SSID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsidError {
    #[error("SSID is {len} bytes, at most {MAX_SSID_LEN} allowed")]
    TooLong { len: usize },

    #[error("SSID is empty")]
    Empty,

    #[error("unrecognized SSID encoding: {raw:?}")]
    Encoding { raw: String },
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ssid(Vec<u8>);

impl Ssid {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_utf8_text(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 text form, `None` when the bytes are not valid UTF-8.
    pub fn decode(&self) -> Option<String> {
        std::str::from_utf8(&self.0).ok().map(str::to_owned)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn validate(&self) -> Result<(), SsidError> {
        match self.0.len() {
            0 => Err(SsidError::Empty),
            len if len > MAX_SSID_LEN => Err(SsidError::TooLong { len }),
            _ => Ok(()),
        }
    }

    /// Encode for a supplicant `ssid=` line: quoted when every byte is
    /// printable ASCII, bare hex otherwise.
    pub fn to_supplicant(&self) -> String {
        if self.0.iter().all(|b| (0x20..0x7f).contains(b)) {
            // Printable ASCII is valid UTF-8.
            format!("\"{}\"", String::from_utf8_lossy(&self.0))
        } else {
            self.to_hex()
        }
    }

    /// Parse the value of a supplicant `ssid=` line.
    pub fn from_supplicant(raw: &str) -> Result<Self, SsidError> {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return Ok(Self::from_utf8_text(inner));
        }
        hex::decode(raw)
            .map(Self)
            .map_err(|_| SsidError::Encoding { raw: raw.to_owned() })
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Some(text) => f.write_str(&text),
            None => write!(f, "0x{}", self.to_hex()),
        }
    }
}

impl fmt::Debug for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ssid({self})")
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SsidRepr {
    Text(String),
    Bytes(Vec<u8>),
}

impl Serialize for Ssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.decode() {
            Some(text) => SsidRepr::Text(text),
            None => SsidRepr::Bytes(self.0.clone()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ssid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SsidRepr::deserialize(deserializer)? {
            SsidRepr::Text(text) => Self::from_utf8_text(&text),
            SsidRepr::Bytes(bytes) => Self(bytes),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_invalid_utf8() {
        let ssid = Ssid::from_bytes(vec![0xff, 0xfe]);
        assert_eq!(ssid.decode(), None);
        assert_eq!(ssid.to_string(), "0xfffe");
    }

    #[test]
    fn supplicant_encoding_quotes_printable_ascii() {
        assert_eq!(Ssid::from_utf8_text("DIRECT-ab").to_supplicant(), "\"DIRECT-ab\"");
    }

    #[test]
    fn supplicant_encoding_hex_for_unicode() {
        let ssid = Ssid::from_utf8_text("café");
        assert_eq!(ssid.to_supplicant(), "636166c3a9");
        assert_eq!(Ssid::from_supplicant("636166c3a9").unwrap(), ssid);
    }

    #[test]
    fn supplicant_parse_rejects_printf_form() {
        assert!(matches!(
            Ssid::from_supplicant("P\"abc\\n\""),
            Err(SsidError::Encoding { .. })
        ));
    }

    #[test]
    fn validate_bounds() {
        assert_eq!(Ssid::from_bytes(vec![]).validate(), Err(SsidError::Empty));
        assert_eq!(
            Ssid::from_bytes(vec![b'a'; 33]).validate(),
            Err(SsidError::TooLong { len: 33 })
        );
        assert!(Ssid::from_utf8_text("Home").validate().is_ok());
    }

    #[test]
    fn serde_keeps_undecodable_bytes() {
        let ssid = Ssid::from_bytes(vec![0xc3, 0x28]);
        let json = serde_json::to_string(&ssid).unwrap();
        assert_eq!(json, "[195,40]");
        assert_eq!(serde_json::from_str::<Ssid>(&json).unwrap(), ssid);

        let text: Ssid = serde_json::from_str("\"Home\"").unwrap();
        assert_eq!(text, Ssid::from_utf8_text("Home"));
    }
}
