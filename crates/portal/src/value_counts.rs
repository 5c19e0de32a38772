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

use crate::dataset::Dataset;
use crate::error::{Result, SelectionError};
use crate::table::TableView;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const COUNT_COLUMN: &str = "count";
const COUNT_COLUMN_FALLBACK: &str = "frequency";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueCountRequest {
    pub column: String,
    pub top_rows: usize,
}

/// Frequency table of one column, most frequent value first.
#[derive(Debug, Clone)]
pub struct ValueCountResult {
    pub column: String,
    pub count_column: String,
    pub frame: DataFrame,
}

impl ValueCountResult {
    pub fn to_table(&self) -> Result<TableView> {
        TableView::from_frame(&self.frame)
    }

    pub fn total(&self) -> Result<u64> {
        let counts = self
            .frame
            .column(&self.count_column)?
            .as_materialized_series()
            .cast(&polars::prelude::DataType::UInt64)?;
        Ok(counts.u64()?.into_iter().flatten().sum())
    }
}

pub fn count_values(dataset: &Dataset, request: &ValueCountRequest) -> Result<ValueCountResult> {
    dataset.require_column(&request.column)?;
    if request.top_rows == 0 {
        return Err(SelectionError::InvalidRowLimit {
            value: request.top_rows,
        }
        .into());
    }
    let column = request.column.as_str();
    let count_column = if column == COUNT_COLUMN {
        COUNT_COLUMN_FALLBACK
    } else {
        COUNT_COLUMN
    };
    let limit = IdxSize::try_from(request.top_rows).unwrap_or(IdxSize::MAX);

    let frame = dataset
        .frame()
        .clone()
        .lazy()
        .select([col(column)])
        .filter(col(column).is_not_null())
        .group_by([col(column)])
        .agg([len().cast(polars::prelude::DataType::UInt64).alias(count_column)])
        .sort(
            [count_column, column],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_maintain_order(true),
        )
        .limit(limit)
        .collect()?;

    debug!(
        column,
        distinct = frame.height(),
        limit = request.top_rows,
        "value counts computed"
    );
    Ok(ValueCountResult {
        column: request.column.clone(),
        count_column: count_column.to_string(),
        frame,
    })
}
