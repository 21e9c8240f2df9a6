use crate::error::Result;
use crate::util::format_pct;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown table of `rows`, or `(no rows)` when empty.
pub fn render_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn print_table<W, T>(out: &mut W, rows: &[T]) -> Result<()>
where
    W: Write,
    T: Tabled + Clone,
{
    writeln!(out, "{}\n", render_table(rows))?;
    Ok(())
}

/// Horizontal bar chart, one bar per `(label, value)`.
///
/// Bars are scaled so the largest value spans `width` characters. Undefined
/// values get no bar and an `n/a` label.
pub fn render_bars(entries: &[(String, Option<f64>)], width: usize, decimals: usize) -> String {
    let label_width = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = entries
        .iter()
        .filter_map(|(_, v)| *v)
        .fold(0.0_f64, f64::max);

    let mut lines = Vec::with_capacity(entries.len());
    for (label, value) in entries {
        let len = match value {
            Some(v) if max > 0.0 => ((v / max) * width as f64).round() as usize,
            _ => 0,
        };
        lines.push(format!(
            "{:<lw$} | {:<w$} {}",
            label,
            "#".repeat(len),
            format_pct(*value, decimals),
            lw = label_width,
            w = width,
        ));
    }
    lines.join("\n")
}
