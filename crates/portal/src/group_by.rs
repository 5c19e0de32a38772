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
use crate::error::{AggregationError, PortalError, Result, SelectionError};
use crate::table::TableView;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const AGGREGATE_COLUMN: &str = "newcol";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Max,
    Min,
    Count,
    Mean,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 5] = [
        AggregateOp::Sum,
        AggregateOp::Max,
        AggregateOp::Min,
        AggregateOp::Count,
        AggregateOp::Mean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Max => "max",
            AggregateOp::Min => "min",
            AggregateOp::Count => "count",
            AggregateOp::Mean => "mean",
        }
    }

    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregateOp::Sum | AggregateOp::Mean)
    }

    fn expr(&self, target: &str) -> Expr {
        match self {
            AggregateOp::Sum => col(target).sum(),
            AggregateOp::Max => col(target).max(),
            AggregateOp::Min => col(target).min(),
            AggregateOp::Count => len(),
            AggregateOp::Mean => col(target).mean(),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateOp {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        AggregateOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AggregationError::UnknownOperation {
                    name: s.to_string(),
                }
                .into()
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupByRequest {
    pub group_by: Vec<String>,
    pub target: String,
    pub operation: AggregateOp,
}

/// One row per distinct non-null key combination, keys sorted ascending.
#[derive(Debug, Clone)]
pub struct GroupByResult {
    pub keys: Vec<String>,
    pub target: String,
    pub operation: AggregateOp,
    pub aggregate_column: String,
    pub frame: DataFrame,
}

impl GroupByResult {
    pub fn columns(&self) -> Vec<String> {
        crate::dataset::column_names(&self.frame)
    }

    pub fn to_table(&self) -> Result<TableView> {
        TableView::from_frame(&self.frame)
    }
}

pub fn group_by(dataset: &Dataset, request: &GroupByRequest) -> Result<GroupByResult> {
    if request.group_by.is_empty() {
        return Err(SelectionError::NoGroupingColumns.into());
    }
    for key in &request.group_by {
        dataset.require_column(key)?;
    }
    let target_kind = dataset.column_kind(&request.target)?;
    if request.operation.requires_numeric()
        && !matches!(target_kind, ColumnKind::Numeric | ColumnKind::Boolean)
    {
        return Err(AggregationError::NonNumericTarget {
            operation: request.operation.to_string(),
            column: request.target.clone(),
            kind: target_kind.to_string(),
        }
        .into());
    }

    let aggregate_column = aggregate_column_name(&request.group_by);
    let keys: Vec<Expr> = request.group_by.iter().map(|k| col(k.as_str())).collect();
    let keys_present = request
        .group_by
        .iter()
        .fold(lit(true), |acc, k| acc.and(col(k.as_str()).is_not_null()));

    let frame = dataset
        .frame()
        .clone()
        .lazy()
        .filter(keys_present)
        .group_by(keys)
        .agg([request
            .operation
            .expr(&request.target)
            .alias(aggregate_column.as_str())])
        .sort(
            request.group_by.clone(),
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()
        .map_err(|source| AggregationError::Failed {
            operation: request.operation.to_string(),
            column: request.target.clone(),
            source,
        })?;

    debug!(
        keys = ?request.group_by,
        target = %request.target,
        operation = %request.operation,
        groups = frame.height(),
        "group-by computed"
    );
    Ok(GroupByResult {
        keys: request.group_by.clone(),
        target: request.target.clone(),
        operation: request.operation,
        aggregate_column,
        frame,
    })
}

fn aggregate_column_name(keys: &[String]) -> String {
    let mut name = AGGREGATE_COLUMN.to_string();
    while keys.iter().any(|k| *k == name) {
        name.push_str("_agg");
    }
    name
}
