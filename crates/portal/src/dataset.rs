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

use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse column classification used for validation and chart roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
}

impl ColumnKind {
    pub fn of(dtype: &polars::prelude::DataType) -> Self {
        use polars::prelude::DataType as D;
        match dtype {
            D::Int8
            | D::Int16
            | D::Int32
            | D::Int64
            | D::UInt8
            | D::UInt16
            | D::UInt32
            | D::UInt64
            | D::Float32
            | D::Float64 => ColumnKind::Numeric,
            D::Boolean => ColumnKind::Boolean,
            D::Date | D::Datetime(_, _) => ColumnKind::Temporal,
            _ => ColumnKind::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: DatasetId,
    pub file_name: String,
    pub loaded_at: DateTime<Utc>,
}

/// The parsed upload. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    metadata: DatasetMetadata,
    frame: DataFrame,
}

impl Dataset {
    pub fn new(file_name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            metadata: DatasetMetadata {
                id: DatasetId::new(),
                file_name: file_name.into(),
                loaded_at: Utc::now(),
            },
            frame,
        }
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        column_kind(&self.frame, name, "the dataset")
    }

    pub fn require_column(&self, name: &str) -> Result<()> {
        self.column_kind(name).map(|_| ())
    }
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn column_kind(frame: &DataFrame, name: &str, table: &str) -> Result<ColumnKind> {
    frame
        .column(name)
        .map(|column| ColumnKind::of(column.dtype()))
        .map_err(|_| PortalError::column_not_found(name, table))
}
