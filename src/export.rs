use crate::{config::Schema, record::ResultSet};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;

/// Renders a metric the way a spreadsheet cell shows it. Lists and nested
/// objects become JSON text; blanks stay empty.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Column-unioned rows, header first. Missing cells are empty strings.
pub fn to_rows(results: &ResultSet, schema: &Schema) -> Vec<Vec<String>> {
    let columns = results.columns(schema);
    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(columns.clone());
    for record in results.records() {
        rows.push(
            columns
                .iter()
                .map(|c| record.get(c).map(cell_text).unwrap_or_default())
                .collect(),
        );
    }
    rows
}

pub fn write_xlsx(results: &ResultSet, schema: &Schema, sheet_name: &str, path: &Path) -> Result<()> {
    let columns = results.columns(schema);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header = Format::new().set_bold();
    for (c, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col(c)?, name, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (r, record) in results.records().iter().enumerate() {
        let row = u32::try_from(r + 1).with_context(|| "too many rows for a worksheet")?;
        for (c, name) in columns.iter().enumerate() {
            if let Some(v) = record.get(name) {
                write_cell(worksheet, row, col(c)?, v)?;
            }
        }
    }

    worksheet.set_column_width(0, 60)?;
    worksheet.set_column_width(1, 80)?;

    workbook
        .save(path)
        .with_context(|| format!("writing spreadsheet: {}", path.display()))?;
    Ok(())
}

pub fn write_json(results: &ResultSet, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(results)?)
        .with_context(|| format!("writing results: {}", path.display()))
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, v: &Value) -> Result<()> {
    match v {
        Value::Null => {}
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                ws.write_number(row, col, f)?;
            }
            None => {
                ws.write_string(row, col, n.to_string())?;
            }
        },
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::String(s) if s.is_empty() => {}
        other => {
            ws.write_string(row, col, cell_text(other))?;
        }
    }
    Ok(())
}

fn col(c: usize) -> Result<u16> {
    u16::try_from(c).with_context(|| "too many columns for a worksheet")
}
