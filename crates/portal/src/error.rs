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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Data frame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to parse CSV file '{file}': {source}")]
    Csv {
        file: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Failed to parse spreadsheet '{file}': {source}")]
    Spreadsheet {
        file: String,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("Spreadsheet '{file}' has no worksheet at index {index}")]
    EmptyWorkbook { file: String, index: usize },
    #[error("Failed to assemble table from '{file}': {source}")]
    Assembly {
        file: String,
        #[source]
        source: polars::error::PolarsError,
    },
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("No dataset has been uploaded yet")]
    NoDataset,
    #[error("Column '{column}' not found in {table}")]
    ColumnNotFound { column: String, table: String },
    #[error("At least one grouping column must be selected")]
    NoGroupingColumns,
    #[error("Row limit must be a positive integer, got {value}")]
    InvalidRowLimit { value: usize },
    #[error("No group-by result is available to chart")]
    NoGroupByResult,
}

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Operation '{operation}' needs a numeric column, but '{column}' is {kind}")]
    NonNumericTarget {
        operation: String,
        column: String,
        kind: String,
    },
    #[error("Failed to apply '{operation}' to column '{column}': {source}")]
    Failed {
        operation: String,
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Unknown aggregation operation '{name}'")]
    UnknownOperation { name: String },
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Unknown chart family '{name}'")]
    UnknownFamily { name: String },
    #[error("Chart '{family}' needs a column for role '{role}'")]
    MissingRole { family: String, role: String },
    #[error("Column '{column}' mapped to role '{role}' does not exist in the result table")]
    UnknownColumn { role: String, column: String },
    #[error("Role '{role}' of chart '{family}' accepts {expected}, but '{column}' is {found}")]
    DataTypeMismatch {
        family: String,
        role: String,
        column: String,
        expected: String,
        found: String,
    },
    #[error("Sunburst path must name at least one column")]
    EmptyPath,
    #[error("Chart catalogue is invalid: {reason}")]
    InvalidCatalogue { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, PortalError>;

impl PortalError {
    pub fn category(&self) -> &'static str {
        match self {
            PortalError::Ingest(_) => "Ingestion",
            PortalError::Selection(_) => "Selection",
            PortalError::Aggregation(_) => "Aggregation",
            PortalError::Chart(_) => "Chart",
            PortalError::Config(_) => "Configuration",
            PortalError::Polars(_) => "Data",
        }
    }

    /// Whether the session can keep going after this error without a new upload.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PortalError::Config(_) | PortalError::Chart(ChartError::InvalidCatalogue { .. })
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            PortalError::Selection(SelectionError::NoDataset) => {
                "Drop a CSV or Excel file to get started.".to_string()
            }
            PortalError::Selection(SelectionError::NoGroupingColumns) => {
                "Choose at least one column to group by.".to_string()
            }
            PortalError::Selection(SelectionError::NoGroupByResult) => {
                "Run a group-by first; charts are built from its result.".to_string()
            }
            PortalError::Ingest(e) => format!("The file could not be read. {e}"),
            _ => self.to_string(),
        }
    }

    pub fn column_not_found(column: &str, table: &str) -> Self {
        PortalError::Selection(SelectionError::ColumnNotFound {
            column: column.to_string(),
            table: table.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_not_recoverable() {
        let error = PortalError::from(ConfigError::InvalidValue {
            field: "charts.size_max".to_string(),
            value: "0".to_string(),
        });
        assert!(!error.is_recoverable());
        assert!(PortalError::from(SelectionError::NoDataset).is_recoverable());
    }
}
