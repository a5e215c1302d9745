//! Clap derive structures for the `repeater` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use repeater_core::{MacAddress, SecurityType, VendorElement};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// repeater -- configure a Wi-Fi Direct group as a hotspot
#[derive(Debug, Parser)]
#[command(
    name = "repeater",
    version,
    about = "Configure a Wi-Fi Direct repeater from the command line",
    long_about = "Resolves the repeater's hotspot configuration from safe-mode settings or\n\
        from the live Wi-Fi Direct group and its p2p_supplicant.conf, and pushes\n\
        edits back into the persistent group.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "REPEATER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to `defaults.output` in the config file)
    #[arg(long, short = 'o', env = "REPEATER_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Key/value table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the resolved hotspot configuration
    Show(ShowArgs),

    /// Edit the hotspot configuration
    Set(SetArgs),

    /// Show repeater service status
    #[command(alias = "st")]
    Status,

    /// Start or stop the repeater service
    Toggle,

    /// Start WPS on the running repeater
    Wps(WpsArgs),

    /// Switch safe mode (settings-only configuration) on or off
    SafeMode(SafeModeArgs),

    /// Manage the CLI configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Show / Set ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print the passphrase instead of masking it
    #[arg(long)]
    pub show_passphrase: bool,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Network name
    #[arg(long, conflicts_with = "ssid_hex")]
    pub ssid: Option<String>,

    /// Network name as raw hex bytes (for names that are not UTF-8)
    #[arg(long)]
    pub ssid_hex: Option<String>,

    /// Passphrase (8-63 printable ASCII characters)
    #[arg(long, conflicts_with = "ask_passphrase")]
    pub passphrase: Option<String>,

    /// Prompt for the passphrase without echoing it
    #[arg(long)]
    pub ask_passphrase: bool,

    /// Group BSSID
    #[arg(long, value_parser = parse_mac, conflicts_with = "clear_bssid")]
    pub bssid: Option<MacAddress>,

    /// Drop the explicit BSSID
    #[arg(long)]
    pub clear_bssid: bool,

    /// Security type
    #[arg(long, value_parser = parse_security)]
    pub security: Option<SecurityType>,

    /// Operating band
    #[arg(long)]
    pub band: Option<BandArg>,

    /// Operating channel (0 lets the driver pick)
    #[arg(long)]
    pub channel: Option<u16>,

    /// Shut the repeater down when no client is connected
    #[arg(long, action = clap::ArgAction::Set)]
    pub auto_shutdown: Option<bool>,

    /// Idle timeout before auto shutdown, in milliseconds (0 = platform default)
    #[arg(long)]
    pub shutdown_timeout: Option<u64>,

    /// Vendor element to add, as hex bytes (repeatable)
    #[arg(long = "vendor-element", value_parser = parse_vendor_element)]
    pub vendor_elements: Vec<VendorElement>,

    /// Remove all vendor elements before adding new ones
    #[arg(long)]
    pub clear_vendor_elements: bool,
}

impl SetArgs {
    /// Whether any flag touches the network name, passphrase or BSSID.
    pub fn edits_credentials(&self) -> bool {
        self.ssid.is_some()
            || self.ssid_hex.is_some()
            || self.passphrase.is_some()
            || self.ask_passphrase
            || self.bssid.is_some()
            || self.clear_bssid
    }

    pub fn is_empty(&self) -> bool {
        !self.edits_credentials()
            && self.security.is_none()
            && self.band.is_none()
            && self.channel.is_none()
            && self.auto_shutdown.is_none()
            && self.shutdown_timeout.is_none()
            && self.vendor_elements.is_empty()
            && !self.clear_vendor_elements
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BandArg {
    /// 2.4 or 5 GHz, driver's choice
    Auto,
    #[value(name = "2.4")]
    Ghz2,
    #[value(name = "5")]
    Ghz5,
    #[value(name = "6")]
    Ghz6,
    #[value(name = "60")]
    Ghz60,
}

fn parse_mac(raw: &str) -> Result<MacAddress, String> {
    MacAddress::parse(raw).map_err(|e| e.to_string())
}

fn parse_security(raw: &str) -> Result<SecurityType, String> {
    raw.parse()
        .map_err(|_| format!("expected wpa2-psk, wpa3-sae or wpa3-sae-transition, got '{raw}'"))
}

fn parse_vendor_element(raw: &str) -> Result<VendorElement, String> {
    VendorElement::from_hex(raw).map_err(|e| format!("invalid hex: {e}"))
}

// ── Service ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WpsArgs {
    /// WPS PIN; push-button mode when omitted
    #[arg(long)]
    pub pin: Option<String>,
}

#[derive(Debug, Args)]
pub struct SafeModeArgs {
    pub state: Switch,

    /// Network name to store along with the switch
    #[arg(long)]
    pub ssid: Option<String>,

    /// Passphrase to store along with the switch
    #[arg(long)]
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
