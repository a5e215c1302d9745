//! Configuration core for Wi-Fi Direct repeater groups.
//!
//! Turns a device's Wi-Fi Direct group-owner capability into an editable
//! hotspot configuration and pushes edits back into the live group:
//!
//! - **[`ConfigurationResolver`]**: Derives an [`ApConfiguration`] from
//!   safe-mode settings, or from the live group plus the supplicant bridge.
//!   Falls back to a read-only result when the bridge is unavailable.
//!
//! - **[`ConfigurationReconciler`]**: Applies an edited configuration.
//!   Only rewrites the supplicant when credentials actually changed, and
//!   always persists the cross-cutting settings.
//!
//! - **[`SupplicantConfiguration`]**: Single-use handle onto one persistent
//!   group in `p2p_supplicant.conf`, reached through a [`SupplicantChannel`].
//!
//! - **[`RepeaterManager`]**: Session object for the repeater service:
//!   connect/disconnect, a `watch`-published [`RepeaterView`], and the
//!   resolve → edit → reconcile cycle with lifecycle gating and cancellation.
//!
//! Platform version gates are injected as a [`PlatformCapabilities`] table.

pub mod binder;
pub mod capability;
pub mod error;
pub mod features;
pub mod manager;
pub mod model;
pub mod reconciler;
pub mod resolver;
pub mod settings;
pub mod supplicant;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binder::{Cancelled, EditSurface, Notifier, RepeaterBinder, ServiceStatus};
pub use capability::{Capability, PlatformCapabilities};
pub use error::CoreError;
pub use features::{P2pFeature, P2pFeatureProbe, ProbeError, describe_features};
pub use manager::{
    CONFIGURE_FAILURE, ConfigureOutcome, LifecycleState, RepeaterManager, RepeaterTitle,
    RepeaterView, ToggleOutcome,
};
pub use reconciler::ConfigurationReconciler;
pub use resolver::{ConfigurationResolver, Resolution};
pub use settings::{MemorySettings, RepeaterSettings, SettingsStore};
pub use supplicant::{
    BridgeError, CONF_PATH_LEGACY, CONF_PATH_VENDOR, FileChannel, SupplicantChannel,
    SupplicantConfiguration,
};

pub use model::{
    ApConfiguration, Band, GroupSnapshot, MacAddress, MacRandomization, PassphraseError,
    SecurityType, Ssid, VendorElement, validate_passphrase,
};
