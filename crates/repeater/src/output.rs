//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use repeater_core::ServiceStatus;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_status(status: Option<ServiceStatus>, color: bool) -> String {
    let Some(status) = status else {
        return "disconnected".into();
    };
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        ServiceStatus::Active => label.green().to_string(),
        ServiceStatus::Starting => label.yellow().to_string(),
        ServiceStatus::Idle => label.dimmed().to_string(),
        ServiceStatus::Destroyed => label.red().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// One row of a two-column field/value table.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering goes through `detail_fn`, since single-item views are
/// built by hand rather than derived.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_fields(rows: Vec<FieldRow>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Output(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Sample {
        name: &'static str,
    }

    #[test]
    fn json_compact_is_single_line() {
        let out = render_single(
            OutputFormat::JsonCompact,
            &Sample { name: "repeater" },
            |_| String::new(),
            |s| s.name.to_owned(),
        )
        .unwrap();
        assert_eq!(out, r#"{"name":"repeater"}"#);
    }

    #[test]
    fn plain_uses_id_fn() {
        let out = render_single(
            OutputFormat::Plain,
            &Sample { name: "repeater" },
            |_| String::new(),
            |s| s.name.to_owned(),
        )
        .unwrap();
        assert_eq!(out, "repeater");
    }

    #[test]
    fn status_without_color_is_plain_text() {
        assert_eq!(paint_status(Some(ServiceStatus::Active), false), "active");
        assert_eq!(paint_status(None, false), "disconnected");
    }
}
