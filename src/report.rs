//! Non-interactive output of a single render pass.

use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::cli::ReportFormat;
use crate::dashboard::{Dashboard, EXEC_SUMMARY_TITLE};
use crate::data::Table;
use crate::ui::widgets::format_cell;

pub fn write_report(dashboard: &Dashboard, format: ReportFormat, out: &mut impl Write) -> Result<()> {
    match format {
        ReportFormat::Text => write_text(dashboard, out).context("Failed to write report"),
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, dashboard).context("Failed to serialize report")?;
            writeln!(out).context("Failed to write report")
        }
    }
}

fn write_text(dashboard: &Dashboard, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", dashboard.title)?;
    writeln!(out, "{}", "=".repeat(dashboard.title.len()))?;
    writeln!(out)?;

    writeln!(out, "{EXEC_SUMMARY_TITLE}")?;
    for metric in dashboard.summary.metrics() {
        writeln!(out, "  {:<16} {}", format!("{}:", metric.label), metric.value)?;
    }

    for section in &dashboard.sections {
        writeln!(out)?;
        writeln!(out, "{}", section.title)?;
        writeln!(out, "{}", "-".repeat(section.title.len()))?;
        write_table(&section.table, out)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", dashboard.footer)
}

/// Left-aligned columns padded to their widest cell
fn write_table(table: &Table, out: &mut impl Write) -> io::Result<()> {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&table.columns)
                .map(|(value, column)| format_cell(value, column.kind))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    write_row(out, &header, &widths)?;
    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(out, &row, &widths)?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, cells: &[&str], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}
