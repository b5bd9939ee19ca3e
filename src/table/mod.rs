use anyhow::{Result, anyhow};
use chrono::NaiveTime;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// One spreadsheet cell, reduced to the shapes the extractor cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Time(NaiveTime),
}

/// A fully materialized sheet: trimmed header row plus row-major cells.
/// Built once by a loader adapter, then only read.
#[derive(Debug, Clone)]
pub struct SheetTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn new(columns: Vec<String>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.trim().to_string()).collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        SheetTable {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().map(move |cells| SheetRow { table: self, cells })
    }

    /// Lower a polars DataFrame (the loader collaborator's table type)
    /// into plain cells. Strings keep their nulls as Empty; numeric and
    /// other dtypes go through AnyValue.
    pub fn from_dataframe(df: &DataFrame) -> Result<SheetTable> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let height = df.height();
        let mut by_column: Vec<Vec<CellValue>> = Vec::with_capacity(column_names.len());

        for col_name in &column_names {
            let series = df
                .column(col_name.as_str())
                .map_err(|e| anyhow!("column {} vanished from DataFrame: {}", col_name, e))?;

            let mut cells = Vec::with_capacity(height);
            match series.dtype() {
                DataType::String => {
                    for v in series.str().map_err(|e| anyhow!("{}", e))?.into_iter() {
                        cells.push(match v {
                            Some(s) => CellValue::Text(s.to_string()),
                            None => CellValue::Empty,
                        });
                    }
                }
                _ => {
                    for i in 0..height {
                        let av = series.get(i).map_err(|e| anyhow!("{}", e))?;
                        cells.push(cell_from_any_value(av));
                    }
                }
            }
            by_column.push(cells);
        }

        let mut table = SheetTable::new(column_names);
        for r in 0..height {
            table.push_row(by_column.iter().map(|c| c[r].clone()).collect());
        }
        Ok(table)
    }

    /// Build a table from JSON row records (one object per customer row).
    /// Column set is the union of keys across all records; Excel time
    /// cells round-trip through JSON as "HH:MM:SS" strings and are
    /// recovered as time values here.
    pub fn from_json_records(records: &[Value]) -> Result<SheetTable> {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashMap<String, ()> = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            match record.as_object() {
                Some(obj) => {
                    for key in obj.keys() {
                        let key = key.trim().to_string();
                        if seen.insert(key.clone(), ()).is_none() {
                            columns.push(key);
                        }
                    }
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Skipped {} non-object records in JSON input", skipped);
        }
        if columns.is_empty() {
            return Err(anyhow!("JSON input contains no row objects with keys"));
        }

        let mut table = SheetTable::new(columns);
        for record in records {
            let Some(obj) = record.as_object() else {
                continue;
            };
            let cells = table
                .columns
                .iter()
                .map(|col| {
                    obj.iter()
                        .find(|(k, _)| k.trim() == col)
                        .map(|(_, v)| cell_from_json(v))
                        .unwrap_or(CellValue::Empty)
                })
                .collect();
            table.push_row(cells);
        }
        Ok(table)
    }
}

/// A borrowed view of one row, with lookup by trimmed column name.
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    table: &'a SheetTable,
    cells: &'a [CellValue],
}

impl<'a> SheetRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table.index.get(column).map(|i| &self.cells[*i])
    }
}

fn cell_from_any_value(av: AnyValue) -> CellValue {
    match av {
        AnyValue::Null => CellValue::Empty,
        AnyValue::String(s) => CellValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => CellValue::Text(s.to_string()),
        AnyValue::Float64(v) => CellValue::Number(v),
        AnyValue::Float32(v) => CellValue::Number(v as f64),
        AnyValue::Int64(v) => CellValue::Number(v as f64),
        AnyValue::Int32(v) => CellValue::Number(v as f64),
        AnyValue::Int16(v) => CellValue::Number(v as f64),
        AnyValue::Int8(v) => CellValue::Number(v as f64),
        AnyValue::UInt64(v) => CellValue::Number(v as f64),
        AnyValue::UInt32(v) => CellValue::Number(v as f64),
        AnyValue::UInt16(v) => CellValue::Number(v as f64),
        AnyValue::UInt8(v) => CellValue::Number(v as f64),
        AnyValue::Boolean(b) => CellValue::Text(b.to_string()),
        other => CellValue::Text(other.to_string()),
    }
}

fn cell_from_json(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) => {
            if let Ok(t) = NaiveTime::parse_from_str(s.trim(), "%H:%M:%S") {
                CellValue::Time(t)
            } else {
                CellValue::Text(s.clone())
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Text(n.to_string()),
        },
        other => CellValue::Text(other.to_string()),
    }
}
