// ── Domain model ──
//
// Plain data shared by the resolver, the reconciler and the supplicant
// bridge. Nothing in here performs I/O.

pub mod ap;
pub mod channel;
pub mod group;
pub mod mac;
pub mod passphrase;
pub mod ssid;

pub use ap::{ApConfiguration, MacRandomization, SecurityType, VendorElement};
pub use channel::{Band, channel_to_frequency, frequency_to_channel};
pub use group::GroupSnapshot;
pub use mac::{MacAddress, MacParseError};
pub use passphrase::{PassphraseError, validate_passphrase};
pub use ssid::{MAX_SSID_LEN, Ssid, SsidError};
