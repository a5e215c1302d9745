// ── WPA passphrase rules ──

use thiserror::Error;

pub const MIN_PASSPHRASE_LEN: usize = 8;
pub const MAX_PASSPHRASE_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassphraseError {
    #[error("must be {MIN_PASSPHRASE_LEN} to {MAX_PASSPHRASE_LEN} characters")]
    Length,

    #[error("must be printable ASCII")]
    NotPrintable,
}

/// Check a WPA-PSK passphrase: 8 to 63 printable ASCII characters.
pub fn validate_passphrase(passphrase: &str) -> Result<(), PassphraseError> {
    if !(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&passphrase.len()) {
        return Err(PassphraseError::Length);
    }
    if !passphrase.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Err(PassphraseError::NotPrintable);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert_eq!(validate_passphrase("short"), Err(PassphraseError::Length));
        assert_eq!(validate_passphrase("eight888"), Ok(()));
        assert_eq!(validate_passphrase(&"a".repeat(63)), Ok(()));
        assert_eq!(validate_passphrase(&"a".repeat(64)), Err(PassphraseError::Length));
    }

    #[test]
    fn control_and_non_ascii_are_rejected() {
        assert_eq!(validate_passphrase("tab\there!"), Err(PassphraseError::NotPrintable));
        assert_eq!(validate_passphrase("pässphrase"), Err(PassphraseError::NotPrintable));
    }
}
