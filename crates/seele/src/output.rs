//! Rendering for `--output`.
//!
//! Structured formats serialize the domain value as-is; `table` and `plain`
//! go through per-command row builders.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// JSON or YAML text for the structured formats, `None` for table / plain.
fn structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Option<String> {
    match format {
        OutputFormat::Json => Some(render_json(data, false)),
        OutputFormat::JsonCompact => Some(render_json(data, true)),
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(data)
                .unwrap_or_else(|e| format!("error: serialization failed: {e}")),
        ),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

/// A list: a rounded table of `to_row` rows, or one `to_line` per item.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    to_line: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(text) = structured(format, data) {
        return text;
    }
    if format == OutputFormat::Plain {
        return data.iter().map(to_line).collect::<Vec<_>>().join("\n");
    }
    let rows: Vec<R> = data.iter().map(to_row).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// A single value with hand-written table and plain views.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail: impl Fn(&T) -> String,
    plain: impl Fn(&T) -> String,
) -> String {
    structured(format, data).unwrap_or_else(|| match format {
        OutputFormat::Plain => plain(data),
        _ => detail(data),
    })
}

/// Write to stdout unless `--quiet`.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{output}");
}

pub(crate) fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}
