// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Upload parsing. The file name decides the parser; content is never sniffed.

use crate::config::IngestConfig;
use crate::dataset::Dataset;
use crate::error::{IngestError, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_ascii_lowercase().ends_with("csv") {
            FileKind::Csv
        } else {
            FileKind::Spreadsheet
        }
    }
}

pub fn read_dataset(file_name: &str, bytes: &[u8], config: &IngestConfig) -> Result<Dataset> {
    let kind = FileKind::from_file_name(file_name);
    debug!(file = file_name, ?kind, size = bytes.len(), "parsing upload");
    let frame = match kind {
        FileKind::Csv => read_csv(file_name, bytes, config)?,
        FileKind::Spreadsheet => read_spreadsheet(file_name, bytes, config)?,
    };
    info!(
        file = file_name,
        rows = frame.height(),
        columns = frame.width(),
        "dataset loaded"
    );
    Ok(Dataset::new(file_name, frame))
}

fn read_csv(file_name: &str, bytes: &[u8], config: &IngestConfig) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(config.infer_schema_length))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|source| {
            IngestError::Csv {
                file: file_name.to_string(),
                source,
            }
            .into()
        })
}

fn read_spreadsheet(file_name: &str, bytes: &[u8], config: &IngestConfig) -> Result<DataFrame> {
    let spreadsheet_error = |source| IngestError::Spreadsheet {
        file: file_name.to_string(),
        source,
    };
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes.to_vec())).map_err(spreadsheet_error)?;
    let range = workbook
        .worksheet_range_at(config.sheet_index)
        .ok_or_else(|| IngestError::EmptyWorkbook {
            file: file_name.to_string(),
            index: config.sheet_index,
        })?
        .map_err(spreadsheet_error)?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row),
        None => Vec::new(),
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            build_column(name, &cells)
        })
        .collect();

    DataFrame::new(columns).map_err(|source| {
        IngestError::Assembly {
            file: file_name.to_string(),
            source,
        }
        .into()
    })
}

/// Blank headers become `Unnamed: {i}`, repeats get `.1`, `.2` suffixes.
pub(crate) fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::Empty => format!("Unnamed: {idx}"),
                other => {
                    let text = other.to_string();
                    if text.trim().is_empty() {
                        format!("Unnamed: {idx}")
                    } else {
                        text
                    }
                }
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellShape {
    Integral,
    Fractional,
    Boolean,
    Text,
}

fn cell_shape(cell: &Data) -> Option<CellShape> {
    match cell {
        Data::Empty => None,
        Data::Int(_) => Some(CellShape::Integral),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            Some(CellShape::Integral)
        }
        Data::Float(_) => Some(CellShape::Fractional),
        Data::Bool(_) => Some(CellShape::Boolean),
        _ => Some(CellShape::Text),
    }
}

fn build_column(name: &str, cells: &[&Data]) -> Column {
    let shape = cells
        .iter()
        .filter_map(|cell| cell_shape(cell))
        .fold(None, |acc: Option<CellShape>, next| match (acc, next) {
            (None, s) => Some(s),
            (Some(a), b) if a == b => Some(a),
            (Some(CellShape::Integral), CellShape::Fractional)
            | (Some(CellShape::Fractional), CellShape::Integral) => Some(CellShape::Fractional),
            _ => Some(CellShape::Text),
        });

    let series = match shape {
        Some(CellShape::Integral) => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    Data::Float(v) => Some(*v as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        Some(CellShape::Fractional) => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        Some(CellShape::Boolean) => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        Some(CellShape::Text) | None => {
            let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
            Series::new(name.into(), values)
        }
    };
    series.into_column()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_fill_blanks_and_dedupe() {
        let row = vec![
            Data::String("city".to_string()),
            Data::Empty,
            Data::String("city".to_string()),
            Data::String("city".to_string()),
        ];
        assert_eq!(
            header_names(&row),
            vec!["city", "Unnamed: 1", "city.1", "city.2"]
        );
    }

    #[test]
    fn test_integral_floats_become_int_column() {
        let cells = [Data::Float(1.0), Data::Int(2), Data::Empty];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = build_column("n", &refs);
        assert_eq!(column.dtype(), &DataType::Int64);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_mixed_cells_fall_back_to_text() {
        let cells = [Data::Float(1.5), Data::String("x".to_string())];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = build_column("v", &refs);
        assert_eq!(column.dtype(), &DataType::String);
    }

    #[test]
    fn test_file_kind_dispatches_on_suffix() {
        assert_eq!(FileKind::from_file_name("Sales.CSV"), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("report.xlsx"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_file_name("notes.txt"), FileKind::Spreadsheet);
    }
}
