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

use crate::dataset::column_kind;
use crate::error::{PortalError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Row-major JSON rendering of a frame, as shown by the page's tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl TableView {
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let columns = frame.get_columns();
        let mut rows = Vec::with_capacity(frame.height());
        for idx in 0..frame.height() {
            let row = columns
                .iter()
                .map(|column| column.get(idx).map(any_value_to_json))
                .collect::<PolarsResult<Vec<_>>>()?;
            rows.push(row);
        }
        Ok(Self {
            columns: columns.iter().map(|c| c.name().to_string()).collect(),
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn any_value_to_json(value: AnyValue<'_>) -> JsonValue {
    match value {
        AnyValue::Null => JsonValue::Null,
        AnyValue::Boolean(v) => JsonValue::Bool(v),
        AnyValue::String(v) => JsonValue::String(v.to_string()),
        AnyValue::StringOwned(v) => JsonValue::String(v.to_string()),
        AnyValue::Int8(v) => v.into(),
        AnyValue::Int16(v) => v.into(),
        AnyValue::Int32(v) => v.into(),
        AnyValue::Int64(v) => v.into(),
        AnyValue::UInt8(v) => v.into(),
        AnyValue::UInt16(v) => v.into(),
        AnyValue::UInt32(v) => v.into(),
        AnyValue::UInt64(v) => v.into(),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => JsonValue::String(other.to_string()),
    }
}

pub fn float_to_json(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

/// Values of one column as JSON, in row order.
pub fn column_json(frame: &DataFrame, name: &str, table: &str) -> Result<Vec<JsonValue>> {
    let column = frame
        .column(name)
        .map_err(|_| PortalError::column_not_found(name, table))?;
    (0..column.len())
        .map(|idx| column.get(idx).map(any_value_to_json).map_err(Into::into))
        .collect()
}

/// Values of one column cast to `f64`; non-castable cells become `None`.
pub fn column_f64(frame: &DataFrame, name: &str, table: &str) -> Result<Vec<Option<f64>>> {
    column_kind(frame, name, table)?;
    let series = frame
        .column(name)?
        .as_materialized_series()
        .cast(&polars::prelude::DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Display labels for grouping values (legend names, facet titles, path labels).
pub fn json_label(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "(null)".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
