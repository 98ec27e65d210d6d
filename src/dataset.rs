//! In-memory tabular dataset plus its CSV codec.
//!
//! The reconcile core only ever sees [`Dataset`] values; reading and writing
//! CSV lives here so the merge stages stay free of I/O.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result as AnyResult, anyhow};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    data::{Value, parse_typed_value},
    error::{ReconcileError, Result},
    infer::{ColumnType, infer_column_types, is_placeholder_token},
    io_utils,
};

pub type Record = Vec<Value>;

/// Ordered rows of cells sharing a fixed, ordered column set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, rejecting duplicate column names and rows whose width
    /// differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ReconcileError::configuration(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ReconcileError::configuration(format!(
                    "row {idx} has {} field(s) but the header has {}",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Skips validation; callers guarantee every row matches `columns`.
    pub(crate) fn from_trusted(columns: Vec<String>, rows: Vec<Record>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Looks up a cell by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Display strings for every row, in column order.
    pub fn display_rows(&self, limit: Option<usize>) -> Vec<Vec<String>> {
        let take = limit.unwrap_or(self.rows.len());
        self.rows
            .iter()
            .take(take)
            .map(|row| row.iter().map(Value::as_display).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    /// Load tokens such as `N/A` or `null` as missing cells.
    pub placeholders_as_missing: bool,
}

/// Reads a headed CSV file into a typed [`Dataset`].
pub fn load_csv(path: &Path, options: &LoadOptions) -> AnyResult<Dataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, options.delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)?;
    let headers = headers
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut raw_rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
        let mut decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
        if options.placeholders_as_missing {
            for field in decoded.iter_mut() {
                if is_placeholder_token(field) {
                    field.clear();
                }
            }
        }
        raw_rows.push(decoded);
    }

    let types = infer_column_types(headers.len(), &raw_rows);
    debug!(
        "Inferred column types for {:?}: {:?}",
        path,
        headers.iter().zip(types.iter()).collect::<Vec<_>>()
    );
    let rows = raw_rows
        .iter()
        .map(|raw| typed_row(raw, &types))
        .collect::<Vec<_>>();
    Dataset::new(headers, rows).map_err(|err| anyhow!("{err} in {path:?}"))
}

fn typed_row(raw: &[String], types: &[ColumnType]) -> Record {
    types
        .iter()
        .enumerate()
        .map(|(idx, ty)| {
            let field = raw.get(idx).map(|s| s.as_str()).unwrap_or("");
            parse_typed_value(field, *ty)
        })
        .collect()
}

/// Writes `dataset` as CSV; `None` or `-` targets stdout.
pub fn write_csv(
    dataset: &Dataset,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> AnyResult<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter, encoding)?;
    writer
        .write_record(dataset.columns())
        .context("Writing output headers")?;
    for (idx, row) in dataset.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(Value::as_display))
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}
