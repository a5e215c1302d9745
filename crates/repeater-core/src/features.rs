// ── Optional Wi-Fi Direct feature detection ──
//
// Some builds ship the query methods without the version bump that
// promises them, so a missing method is only worth a warning once the
// capability table says the query is guaranteed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::{debug, warn};

use crate::capability::{Capability, PlatformCapabilities};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum P2pFeature {
    #[strum(to_string = "vendor elements")]
    SetVendorElements,
    #[strum(to_string = "client removal")]
    GroupClientRemoval,
    #[strum(to_string = "PCC mode")]
    PccMode,
    #[strum(to_string = "Wi-Fi Direct R2")]
    WifiDirectR2,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("{0} query is not available on this build")]
    MissingMethod(P2pFeature),
}

/// Access to the platform's optional feature queries.
pub trait P2pFeatureProbe {
    fn is_supported(&self, feature: P2pFeature) -> Result<bool, ProbeError>;
}

/// Features the platform reports as supported, in declaration order.
pub fn supported_features(
    probe: Option<&dyn P2pFeatureProbe>,
    caps: &PlatformCapabilities,
) -> Vec<P2pFeature> {
    let Some(probe) = probe.filter(|_| caps.has(Capability::P2pFeatureQuery)) else {
        return Vec::new();
    };
    P2pFeature::iter()
        .filter(|feature| match probe.is_supported(*feature) {
            Ok(supported) => supported,
            Err(e) => {
                if caps.has(Capability::FeatureQueryGuaranteed(*feature)) {
                    warn!(error = %e, "feature query missing");
                } else {
                    debug!(error = %e, "feature query unavailable on this build");
                }
                false
            }
        })
        .collect()
}

/// Comma-separated display names of the supported features, empty if none.
pub fn describe_features(
    probe: Option<&dyn P2pFeatureProbe>,
    caps: &PlatformCapabilities,
) -> String {
    supported_features(probe, caps)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
