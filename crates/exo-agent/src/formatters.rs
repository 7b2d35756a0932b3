//! Output formatters for CLI commands.
//!
//! Reports go through [`format_output`]; gathered metrics go through
//! [`format_metrics`], whose text form is the line protocol understood by
//! most time-series stores.

use anyhow::Result;
use colored::Colorize;
use exo_core::cli::OutputFormat;
use exo_core::{FieldValue, Metric};
use serde::Serialize;

/// Formats a report in the requested output format.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
///
/// # Examples
///
/// ```
/// use exo_agent::formatters::format_output;
/// use exo_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Report {
///     name: String,
///     running: bool,
/// }
///
/// let report = Report { name: "mock".to_string(), running: true };
///
/// let output = format_output(&report, OutputFormat::Text)?;
/// assert_eq!(output, "name=mock\nrunning=true");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// Formats gathered metrics, one per line.
///
/// JSON output is one compact object per line so a long-running `run` can
/// be piped into line-oriented tools.
///
/// # Errors
///
/// Returns an error if a metric cannot be serialized.
pub fn format_metrics(metrics: &[Metric], format: OutputFormat) -> Result<String> {
    let mut lines = Vec::with_capacity(metrics.len());
    for metric in metrics {
        lines.push(match format {
            OutputFormat::Json => serde_json::to_string(metric)?,
            OutputFormat::Text => line_protocol::format(metric),
            OutputFormat::Pretty => line_protocol::format_colored(metric),
        });
    }
    Ok(lines.join("\n"))
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Formats data as indented JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Plain `path=value` lines for scripts and `grep`.
pub mod text {
    use super::{Result, Serialize};
    use serde_json::Value;

    /// Flattens data into one `path=value` line per leaf.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        flatten(&value, String::new(), &mut lines);
        Ok(lines.join("\n"))
    }

    fn flatten(value: &Value, path: String, lines: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    flatten(child, child_path, lines);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    flatten(child, format!("{path}[{i}]"), lines);
                }
            }
            Value::String(s) => lines.push(format!("{path}={s}")),
            Value::Null => lines.push(format!("{path}=")),
            other => lines.push(format!("{path}={other}")),
        }
    }
}

/// Colored, indented output for terminals.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;

    /// Formats data as an indented tree of `key: value` lines.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        render(&value, 0, &mut lines);
        Ok(lines.join("\n"))
    }

    fn scalar(value: &Value) -> String {
        match value {
            Value::Null => "-".dimmed().to_string(),
            Value::Bool(b) => b.to_string().yellow().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) => s.green().to_string(),
            Value::Array(_) | Value::Object(_) => String::new(),
        }
    }

    fn render(value: &Value, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if child.is_object() || child.is_array() {
                        lines.push(format!("{indent}{}:", key.blue().bold()));
                        render(child, depth + 1, lines);
                    } else {
                        lines.push(format!("{indent}{}: {}", key.blue().bold(), scalar(child)));
                    }
                }
            }
            Value::Array(items) if items.is_empty() => {
                lines.push(format!("{indent}{}", "(none)".dimmed()));
            }
            Value::Array(items) => {
                for child in items {
                    if child.is_object() || child.is_array() {
                        lines.push(format!("{indent}-"));
                        render(child, depth + 1, lines);
                    } else {
                        lines.push(format!("{indent}- {}", scalar(child)));
                    }
                }
            }
            other => lines.push(format!("{indent}{}", scalar(other))),
        }
    }
}

/// Line protocol rendering of metrics.
pub mod line_protocol {
    use super::{Colorize, FieldValue, Metric};
    use std::fmt::Write as _;

    fn escape(text: &str, special: &[char]) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if special.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    fn name(text: &str) -> String {
        escape(text, &[',', ' '])
    }

    fn key(text: &str) -> String {
        escape(text, &[',', '=', ' '])
    }

    fn value(value: &FieldValue) -> String {
        match value {
            FieldValue::Int(v) => format!("{v}i"),
            FieldValue::Uint(v) => format!("{v}u"),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::String(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
        }
    }

    fn parts(metric: &Metric) -> (String, String, String) {
        let mut series = name(metric.name());
        for tag in metric.tags() {
            let _ = write!(series, ",{}={}", key(&tag.key), key(&tag.value));
        }
        let fields = metric
            .fields()
            .iter()
            .map(|f| format!("{}={}", key(&f.key), value(&f.value)))
            .collect::<Vec<_>>()
            .join(",");
        let time = metric
            .time()
            .timestamp_nanos_opt()
            .map_or_else(|| metric.time().timestamp().to_string(), |n| n.to_string());
        (series, fields, time)
    }

    /// Renders one metric as a line protocol line.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use exo_agent::formatters::line_protocol;
    /// use exo_core::Metric;
    ///
    /// let metric = Metric::builder("cpu")
    ///     .tag("host", "a b")
    ///     .field("value", 42_i64)
    ///     .field("note", "say \"hi\"")
    ///     .time(DateTime::from_timestamp_nanos(0))
    ///     .build();
    ///
    /// assert_eq!(
    ///     line_protocol::format(&metric),
    ///     r#"cpu,host=a\ b value=42i,note="say \"hi\"" 0"#
    /// );
    /// ```
    #[must_use]
    pub fn format(metric: &Metric) -> String {
        let (series, fields, time) = parts(metric);
        format!("{series} {fields} {time}")
    }

    /// Same as [`format`] with the series highlighted.
    #[must_use]
    pub fn format_colored(metric: &Metric) -> String {
        let (series, fields, time) = parts(metric);
        format!("{} {fields} {}", series.green().bold(), time.dimmed())
    }
}
