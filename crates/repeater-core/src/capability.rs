// ── Platform capability table ──
//
// Platform-version gates live here and nowhere else. Everything else in
// the crate asks `PlatformCapabilities::has` so tests can inject any
// combination.

use std::collections::HashMap;
use std::fmt;

use strum::IntoEnumIterator;

use crate::features::P2pFeature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The group reports its operating frequency.
    GroupFrequency,
    /// Optional Wi-Fi Direct feature flags can be queried at all.
    P2pFeatureQuery,
    /// Per-association MAC randomization for P2P groups.
    P2pMacRandomization,
    /// The group reports WPA3 / WPA3 transition security.
    Wpa3GroupSecurity,
    /// Interface hardware address is reachable through introspection.
    InterfaceAddress,
    /// The feature query is expected to exist; a missing method is a bug
    /// worth logging rather than an old build.
    FeatureQueryGuaranteed(P2pFeature),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureQueryGuaranteed(feature) => write!(f, "FeatureQueryGuaranteed({feature:?})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    table: HashMap<Capability, bool>,
}

impl PlatformCapabilities {
    /// Empty table: every capability reports absent.
    pub fn none() -> Self {
        Self::default()
    }

    /// Table for an Android API level. Device-specific capabilities
    /// (MAC randomization) start absent and are set with [`with`](Self::with).
    pub fn for_api_level(level: u32) -> Self {
        let mut caps = Self::none()
            .with(Capability::GroupFrequency, level >= 29)
            .with(Capability::P2pFeatureQuery, level >= 30)
            .with(Capability::InterfaceAddress, level >= 30)
            .with(Capability::Wpa3GroupSecurity, level >= 36)
            .with(Capability::P2pMacRandomization, false);
        for feature in P2pFeature::iter() {
            let floor = match feature {
                P2pFeature::SetVendorElements | P2pFeature::GroupClientRemoval => 33,
                P2pFeature::PccMode | P2pFeature::WifiDirectR2 => 36,
            };
            caps = caps.with(Capability::FeatureQueryGuaranteed(feature), level >= floor);
        }
        caps
    }

    #[must_use]
    pub fn with(mut self, capability: Capability, enabled: bool) -> Self {
        self.table.insert(capability, enabled);
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.table.get(&capability).copied().unwrap_or(false)
    }

    /// Enabled capabilities, sorted by name.
    pub fn enabled(&self) -> Vec<Capability> {
        let mut caps: Vec<Capability> = self
            .table
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(cap, _)| *cap)
            .collect();
        caps.sort_by_key(ToString::to_string);
        caps
    }
}
