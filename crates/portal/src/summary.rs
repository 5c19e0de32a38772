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

use crate::dataset::{ColumnKind, Dataset};
use crate::error::Result;
use crate::table::{any_value_to_json, float_to_json, TableView};
use polars::prelude::QuantileMethod;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub file_name: String,
    pub shape: Shape,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<JsonValue>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "columns", rename_all = "snake_case")]
pub enum Describe {
    Numeric(Vec<NumericStats>),
    Text(Vec<TextStats>),
}

impl Describe {
    pub const NUMERIC_ROWS: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    pub const TEXT_ROWS: [&'static str; 4] = ["count", "unique", "top", "freq"];

    /// Statistics as rows, one column per described column, like the classic
    /// `describe()` layout.
    pub fn to_table(&self) -> TableView {
        match self {
            Describe::Numeric(stats) => {
                let mut columns = vec!["statistic".to_string()];
                columns.extend(stats.iter().map(|s| s.column.clone()));
                let rows = Self::NUMERIC_ROWS
                    .iter()
                    .enumerate()
                    .map(|(idx, label)| {
                        let mut row = vec![JsonValue::String(label.to_string())];
                        row.extend(stats.iter().map(|s| match idx {
                            0 => JsonValue::from(s.count),
                            1 => opt_float(s.mean),
                            2 => opt_float(s.std),
                            3 => opt_float(s.min),
                            4 => opt_float(s.q25),
                            5 => opt_float(s.median),
                            6 => opt_float(s.q75),
                            _ => opt_float(s.max),
                        }));
                        row
                    })
                    .collect();
                TableView { columns, rows }
            }
            Describe::Text(stats) => {
                let mut columns = vec!["statistic".to_string()];
                columns.extend(stats.iter().map(|s| s.column.clone()));
                let rows = Self::TEXT_ROWS
                    .iter()
                    .enumerate()
                    .map(|(idx, label)| {
                        let mut row = vec![JsonValue::String(label.to_string())];
                        row.extend(stats.iter().map(|s| match idx {
                            0 => JsonValue::from(s.count),
                            1 => JsonValue::from(s.unique),
                            2 => s.top.clone().unwrap_or(JsonValue::Null),
                            _ => JsonValue::from(s.freq),
                        }));
                        row
                    })
                    .collect();
                TableView { columns, rows }
            }
        }
    }
}

fn opt_float(value: Option<f64>) -> JsonValue {
    value.map(float_to_json).unwrap_or(JsonValue::Null)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnType {
    pub column: String,
    pub dtype: String,
    pub kind: ColumnKind,
}

pub fn shape(dataset: &Dataset) -> Shape {
    Shape {
        rows: dataset.row_count(),
        columns: dataset.column_count(),
    }
}

pub fn overview(dataset: &Dataset) -> DatasetOverview {
    DatasetOverview {
        file_name: dataset.metadata().file_name.clone(),
        shape: shape(dataset),
        columns: dataset.column_names(),
    }
}

pub fn describe(dataset: &Dataset) -> Result<Describe> {
    let frame = dataset.frame();
    let numeric: Vec<&Column> = frame
        .get_columns()
        .iter()
        .filter(|c| ColumnKind::of(c.dtype()).is_numeric())
        .collect();
    if numeric.is_empty() {
        let stats = frame
            .get_columns()
            .par_iter()
            .map(|c| text_stats(c.as_materialized_series()))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Describe::Text(stats));
    }
    let stats = numeric
        .par_iter()
        .map(|c| numeric_stats(c.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;
    Ok(Describe::Numeric(stats))
}

fn numeric_stats(series: &Series) -> Result<NumericStats> {
    let cast = series.cast(&polars::prelude::DataType::Float64)?;
    let values = cast.f64()?;
    let count = values.len() - values.null_count();
    if count == 0 {
        return Ok(NumericStats {
            column: series.name().to_string(),
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            median: None,
            q75: None,
            max: None,
        });
    }
    Ok(NumericStats {
        column: series.name().to_string(),
        count,
        mean: values.mean(),
        std: values.std(1),
        min: values.min(),
        q25: values.quantile(0.25, QuantileMethod::Linear).ok().flatten(),
        median: values.quantile(0.5, QuantileMethod::Linear).ok().flatten(),
        q75: values.quantile(0.75, QuantileMethod::Linear).ok().flatten(),
        max: values.max(),
    })
}

fn text_stats(series: &Series) -> Result<TextStats> {
    let count = series.len() - series.null_count();
    let non_null = series.drop_nulls();
    let unique = non_null.n_unique()?;
    let counts = DataFrame::new(vec![non_null.into_column()])?
        .lazy()
        .group_by([col(series.name().clone())])
        .agg([len().alias("__freq")])
        .sort(
            ["__freq"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(1)
        .collect()?;
    let (top, freq) = if counts.height() == 0 {
        (None, 0)
    } else {
        let top = any_value_to_json(counts.column(series.name().as_str())?.get(0)?);
        let freq = counts
            .column("__freq")?
            .get(0)?
            .extract::<usize>()
            .unwrap_or(0);
        (Some(top), freq)
    };
    Ok(TextStats {
        column: series.name().to_string(),
        count,
        unique,
        top,
        freq,
    })
}

pub fn head(dataset: &Dataset, rows: usize) -> Result<TableView> {
    TableView::from_frame(&dataset.frame().head(Some(rows)))
}

pub fn tail(dataset: &Dataset, rows: usize) -> Result<TableView> {
    TableView::from_frame(&dataset.frame().tail(Some(rows)))
}

pub fn dtypes(dataset: &Dataset) -> Vec<ColumnType> {
    dataset
        .frame()
        .get_columns()
        .iter()
        .map(|c| ColumnType {
            column: c.name().to_string(),
            dtype: c.dtype().to_string(),
            kind: ColumnKind::of(c.dtype()),
        })
        .collect()
}
