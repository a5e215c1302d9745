// ── Core error types ──
//
// Errors that escape repeater-core. Bridge-level failures are normally
// absorbed into a read-only resolution one layer up; only a missing
// configuration, a cancelled cycle or a broken caller contract reach
// the consumer.

use thiserror::Error;

use crate::supplicant::BridgeError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Resolution ───────────────────────────────────────────────────
    #[error("Repeater configuration unavailable: no safe-mode settings and no live group")]
    ConfigurationUnavailable,

    #[error("Configuration cycle cancelled")]
    Cancelled,

    // ── Caller contract ──────────────────────────────────────────────
    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Collaborators ────────────────────────────────────────────────
    #[error("Supplicant bridge: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Settings store: {message}")]
    Settings { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Cancellation is expected and must stay silent at every call site.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Bridge(BridgeError::Cancelled))
    }
}
