//! Configuration file for the repeater CLI.
//!
//! One TOML file holds the persisted repeater settings, the platform
//! profile that builds the capability table, the supplicant configuration
//! location, and optionally a captured group to stand in for a live
//! repeater service. [`FileSettings`] exposes the settings section as a
//! [`SettingsStore`].

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use repeater_core::supplicant::{CONF_PATH_LEGACY, CONF_PATH_VENDOR};
use repeater_core::{
    Capability, CoreError, GroupSnapshot, MacAddress, P2pFeature, P2pFeatureProbe,
    PlatformCapabilities, ProbeError, RepeaterSettings, SecurityType, SettingsStore,
    validate_passphrase,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to deserialize config: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Persisted repeater settings.
    #[serde(default)]
    pub settings: RepeaterSettings,

    #[serde(default)]
    pub platform: PlatformProfile,

    #[serde(default)]
    pub supplicant: SupplicantProfile,

    /// Captured group used in place of a live repeater service.
    pub group: Option<GroupProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// What the platform supports. Drives the capability table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformProfile {
    /// Android API level the platform behaves like.
    #[serde(default = "default_api_level")]
    pub api_level: u32,

    /// Device supports per-association P2P MAC randomization.
    #[serde(default)]
    pub p2p_mac_randomization: bool,

    /// Optional Wi-Fi Direct features the platform answers `true` for.
    #[serde(default)]
    pub features: Vec<P2pFeature>,
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
            p2p_mac_randomization: false,
            features: Vec::new(),
        }
    }
}

fn default_api_level() -> u32 {
    36
}

impl PlatformProfile {
    pub fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::for_api_level(self.api_level)
            .with(Capability::P2pMacRandomization, self.p2p_mac_randomization)
    }
}

impl P2pFeatureProbe for PlatformProfile {
    fn is_supported(&self, feature: P2pFeature) -> Result<bool, ProbeError> {
        Ok(self.features.contains(&feature))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SupplicantProfile {
    /// Path to `p2p_supplicant.conf`. Probed from the well-known
    /// locations when unset.
    pub conf_path: Option<PathBuf>,
}

impl SupplicantProfile {
    pub fn conf_path(&self) -> PathBuf {
        if let Some(ref path) = self.conf_path {
            return path.clone();
        }
        [CONF_PATH_VENDOR, CONF_PATH_LEGACY]
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .unwrap_or_else(|| PathBuf::from(CONF_PATH_VENDOR))
    }
}

/// A captured Wi-Fi Direct group plus the service state around it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupProfile {
    pub network_name: String,
    pub passphrase: Option<String>,
    pub owner_address: Option<MacAddress>,
    #[serde(default)]
    pub security_type: SecurityType,
    /// Operating frequency in MHz, 0 if unknown.
    #[serde(default)]
    pub frequency_mhz: u32,
    #[serde(default = "default_interface")]
    pub interface_name: String,
    pub interface_address: Option<MacAddress>,

    /// The device's own P2P address as the service reports it.
    pub device_address: Option<MacAddress>,

    /// Whether the repeater service is running.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_interface() -> String {
    "p2p-wlan0-0".into()
}
fn default_active() -> bool {
    true
}

impl GroupProfile {
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            network_name: self.network_name.clone(),
            passphrase: self.passphrase.clone(),
            owner_address: self.owner_address,
            security_type: self.security_type,
            frequency_mhz: self.frequency_mhz,
            interface_name: self.interface_name.clone(),
            interface_address: self.interface_address,
        }
    }
}

impl Config {
    /// Reject settings the core would refuse to apply anyway.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref ssid) = self.settings.network_name {
            ssid.validate().map_err(|e| ConfigError::Validation {
                field: "settings.network_name".into(),
                reason: e.to_string(),
            })?;
        }
        if let Some(ref passphrase) = self.settings.passphrase {
            validate_passphrase(passphrase).map_err(|e| ConfigError::Validation {
                field: "settings.passphrase".into(),
                reason: e.to_string(),
            })?;
        }
        if let Some(ref group) = self.group {
            if group.network_name.is_empty() {
                return Err(ConfigError::Validation {
                    field: "group.network_name".into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "p2p-repeater", "repeater").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("repeater");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` with `REPEATER_` environment overrides.
///
/// Nested keys use a double underscore: `REPEATER_SETTINGS__SAFE_MODE=true`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = file_figment(path)
        .merge(Env::prefixed("REPEATER_").split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Load only what is on disk, without environment overrides.
fn load_file(path: &Path) -> Result<Config, ConfigError> {
    Ok(file_figment(path).extract()?)
}

fn file_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Rewrite the `[group]` table on disk, leaving everything else as it is.
/// No-op when the file has no group.
pub fn update_group(path: &Path, f: impl FnOnce(&mut GroupProfile)) -> Result<(), ConfigError> {
    let mut config = load_file(path)?;
    let Some(ref mut group) = config.group else {
        return Ok(());
    };
    f(group);
    save_config(path, &config)
}

// ── Settings store ──────────────────────────────────────────────────

/// [`SettingsStore`] over the `[settings]` table of a config file.
///
/// Every load re-reads the file, and every store rewrites it while
/// keeping the other sections as they are on disk. Loads see `REPEATER_`
/// environment overrides; stores never write them back.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    fn load(&self) -> RepeaterSettings {
        match load_config(&self.path) {
            Ok(config) => config.settings,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable settings, using defaults"
                );
                RepeaterSettings::default()
            }
        }
    }

    fn store(&self, settings: &RepeaterSettings) -> Result<(), CoreError> {
        let effective = load_config(&self.path).ok().map(|c| c.settings);
        self.store_over(settings, effective.as_ref())
            .map_err(|e| CoreError::Settings {
                message: e.to_string(),
            })
    }
}

impl FileSettings {
    /// Write `settings`, where `effective` is what [`load`](SettingsStore::load)
    /// would have returned.
    fn store_over(
        &self,
        settings: &RepeaterSettings,
        effective: Option<&RepeaterSettings>,
    ) -> Result<(), ConfigError> {
        let mut config = load_file(&self.path)?;
        config.settings = match effective {
            Some(effective) => without_overrides(&config.settings, effective, settings)?,
            None => settings.clone(),
        };
        save_config(&self.path, &config)
    }
}

/// Keys of `next` still equal to their overridden value keep the value on
/// disk. A key the caller changed is written as changed.
fn without_overrides(
    on_disk: &RepeaterSettings,
    effective: &RepeaterSettings,
    next: &RepeaterSettings,
) -> Result<RepeaterSettings, ConfigError> {
    if effective == on_disk {
        return Ok(next.clone());
    }
    let (toml::Value::Table(disk), toml::Value::Table(env), toml::Value::Table(mut out)) = (
        toml::Value::try_from(on_disk)?,
        toml::Value::try_from(effective)?,
        toml::Value::try_from(next)?,
    ) else {
        return Ok(next.clone());
    };
    for (key, value) in &env {
        if disk.get(key) == Some(value) || out.get(key) != Some(value) {
            continue;
        }
        match disk.get(key) {
            Some(kept) => out.insert(key.clone(), kept.clone()),
            None => out.remove(key),
        };
    }
    Ok(toml::Value::Table(out).try_into()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use repeater_core::{Band, Ssid};

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.defaults.output, "table");
        assert_eq!(config.settings, RepeaterSettings::default());
        assert_eq!(config.platform.api_level, 36);
        assert!(config.group.is_none());
    }

    #[test]
    fn reads_settings_and_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[settings]
safe_mode = true
network_name = "Home"
passphrase = "secret123"
operating_band = 2
operating_channel = 36

[platform]
api_level = 30

[group]
network_name = "DIRECT-rp-Repeater"
passphrase = "system-pass"
owner_address = "02:11:22:33:44:55"
frequency_mhz = 5180
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.settings.safe_mode);
        assert_eq!(config.settings.network_name, Some(Ssid::from_utf8_text("Home")));
        assert_eq!(config.settings.operating_band, Band::GHZ_5);
        assert_eq!(config.settings.operating_channel, 36);

        let group = config.group.unwrap();
        assert!(group.active);
        let snapshot = group.snapshot();
        assert_eq!(snapshot.interface_name, "p2p-wlan0-0");
        assert_eq!(snapshot.channel(), Some(36));

        let caps = config.platform.capabilities();
        assert!(caps.has(Capability::P2pFeatureQuery));
        assert!(!caps.has(Capability::Wpa3GroupSecurity));
    }

    #[test]
    fn short_passphrase_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\npassphrase = \"short\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "settings.passphrase"));
    }

    #[test]
    fn non_ascii_passphrase_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\npassphrase = \"pässphrase\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref reason, .. } if reason == "must be printable ASCII")
        );
    }

    #[test]
    fn file_settings_round_trip_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            platform: PlatformProfile {
                api_level: 33,
                p2p_mac_randomization: true,
                ..PlatformProfile::default()
            },
            ..Config::default()
        };
        save_config(&path, &config).unwrap();

        let store = FileSettings::new(&path);
        store
            .modify(&mut |s: &mut RepeaterSettings| {
                s.operating_band = Band::GHZ_2;
                s.operating_channel = 11;
                s.auto_shutdown_enabled = false;
            })
            .unwrap();

        let settings = store.load();
        assert_eq!(settings.operating_band, Band::GHZ_2);
        assert_eq!(settings.operating_channel, 11);
        assert!(!settings.auto_shutdown_enabled);

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded.platform.api_level, 33);
        assert!(reloaded.platform.p2p_mac_randomization);
    }

    #[test]
    fn store_keeps_overridden_keys_off_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\noperating_channel = 6\n").unwrap();
        let store = FileSettings::new(&path);

        // What a load sees with REPEATER_SETTINGS__SHUTDOWN_TIMEOUT_MILLIS=777 set.
        let effective = RepeaterSettings {
            operating_channel: 6,
            shutdown_timeout_millis: 777,
            ..RepeaterSettings::default()
        };
        let edited = RepeaterSettings {
            operating_channel: 11,
            ..effective.clone()
        };
        store.store_over(&edited, Some(&effective)).unwrap();

        let on_disk = load_file(&path).unwrap().settings;
        assert_eq!(on_disk.operating_channel, 11);
        assert_eq!(on_disk.shutdown_timeout_millis, 0);
    }

    #[test]
    fn store_writes_changed_overridden_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\nsafe_mode = false\n").unwrap();
        let store = FileSettings::new(&path);

        let effective = RepeaterSettings {
            safe_mode: true,
            ..RepeaterSettings::default()
        };
        let edited = RepeaterSettings {
            safe_mode: false,
            auto_shutdown_enabled: false,
            ..effective.clone()
        };
        store.store_over(&edited, Some(&effective)).unwrap();

        let on_disk = load_file(&path).unwrap().settings;
        assert!(!on_disk.safe_mode);
        assert!(!on_disk.auto_shutdown_enabled);
    }

    #[test]
    fn platform_profile_answers_feature_queries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[platform]\napi_level = 33\nfeatures = [\"set-vendor-elements\"]\n",
        )
        .unwrap();
        let platform = load_config(&path).unwrap().platform;
        assert_eq!(platform.is_supported(P2pFeature::SetVendorElements), Ok(true));
        assert_eq!(platform.is_supported(P2pFeature::PccMode), Ok(false));
    }

    #[test]
    fn update_group_touches_only_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[settings]\noperating_channel = 6\n\n[group]\nnetwork_name = \"DIRECT-rp-Old\"\n",
        )
        .unwrap();

        update_group(&path, |g| g.network_name = "DIRECT-rp-New".into()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.group.unwrap().network_name, "DIRECT-rp-New");
        assert_eq!(config.settings.operating_channel, 6);
    }

    #[test]
    fn explicit_conf_path_wins() {
        let profile = SupplicantProfile {
            conf_path: Some(PathBuf::from("/tmp/p2p_supplicant.conf")),
        };
        assert_eq!(profile.conf_path(), PathBuf::from("/tmp/p2p_supplicant.conf"));
    }
}
