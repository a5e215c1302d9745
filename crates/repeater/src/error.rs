//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use repeater_config::ConfigError;
use repeater_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resolution ───────────────────────────────────────────────────
    #[error("Failed to obtain repeater configuration")]
    #[diagnostic(
        code(repeater::unavailable),
        help(
            "Neither safe-mode settings nor a repeater group are available.\n\
             Add a [group] table to {path}, or run:\n\
             repeater safe-mode on --ssid NAME --passphrase PASS"
        )
    )]
    Unavailable { path: String },

    #[error("The configuration is read-only")]
    #[diagnostic(
        code(repeater::read_only),
        help(
            "The supplicant configuration could not be read, so network name,\n\
             passphrase and BSSID cannot be changed. Check [supplicant] conf_path\n\
             and that the file is readable, or switch to safe mode."
        )
    )]
    ReadOnly,

    #[error("Cancelled")]
    #[diagnostic(code(repeater::cancelled))]
    Cancelled,

    #[error("Another configure cycle is in progress")]
    #[diagnostic(code(repeater::busy))]
    Busy,

    #[error("The repeater service is not running")]
    #[diagnostic(
        code(repeater::not_running),
        help("Start it with: repeater toggle")
    )]
    NotRunning,

    #[error("Failed to apply configuration: {message}")]
    #[diagnostic(code(repeater::apply_failed))]
    ApplyFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(repeater::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(repeater::precondition))]
    Precondition { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(repeater::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(repeater::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Core ─────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(repeater::core))]
    Core(CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(repeater::output))]
    Output(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unavailable { .. } => exit_code::NOT_FOUND,
            Self::ReadOnly => exit_code::PERMISSION,
            Self::Busy | Self::NotRunning => exit_code::CONFLICT,
            Self::Cancelled => exit_code::INTERRUPTED,
            Self::Validation { .. }
            | Self::Precondition { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigurationUnavailable => CliError::Unavailable {
                path: repeater_config::config_path().display().to_string(),
            },
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::PreconditionViolation { message } => CliError::Precondition { message },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            other if other.is_cancelled() => CliError::Cancelled,
            other => CliError::Core(other),
        }
    }
}
