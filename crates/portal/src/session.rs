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

use crate::charts::{ChartCatalogue, ChartRequest, Figure, FigureBuilder, ValueCountFigures};
use crate::config::PortalConfig;
use crate::dataset::Dataset;
use crate::error::{Result, SelectionError};
use crate::group_by::{self, AggregateOp, GroupByRequest, GroupByResult};
use crate::ingest;
use crate::summary::{self, ColumnType, DatasetOverview, Describe};
use crate::table::TableView;
use crate::value_counts::{self, ValueCountRequest};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ValueCountResponse {
    pub column: String,
    pub count_column: String,
    pub total: u64,
    pub table: TableView,
    pub figures: ValueCountFigures,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupByResponse {
    pub keys: Vec<String>,
    pub target: String,
    pub operation: AggregateOp,
    pub aggregate_column: String,
    pub table: TableView,
}

/// One user's working state: the uploaded table and the results computed from it.
///
/// Each method corresponds to one action on the page. A failed action leaves
/// the dataset in place so the next request can proceed.
pub struct Session {
    config: PortalConfig,
    catalogue: ChartCatalogue,
    dataset: Option<Dataset>,
    group_by: Option<GroupByResult>,
}

impl Session {
    pub fn new(config: PortalConfig) -> Result<Self> {
        Ok(Self {
            config,
            catalogue: ChartCatalogue::builtin()?,
            dataset: None,
            group_by: None,
        })
    }

    pub fn dataset(&self) -> Result<&Dataset> {
        self.dataset
            .as_ref()
            .ok_or_else(|| SelectionError::NoDataset.into())
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    /// Replaces the dataset and drops every result derived from the old one.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<DatasetOverview> {
        let dataset = match ingest::read_dataset(file_name, bytes, &self.config.ingest) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(file_name, error = %e, "upload rejected");
                return Err(e);
            }
        };
        let overview = summary::overview(&dataset);
        self.dataset = Some(dataset);
        self.group_by = None;
        Ok(overview)
    }

    pub fn overview(&self) -> Result<DatasetOverview> {
        Ok(summary::overview(self.dataset()?))
    }

    /// The whole table, or its first `preview_rows` rows when a cap is configured.
    pub fn preview(&self) -> Result<TableView> {
        let dataset = self.dataset()?;
        match self.config.views.preview_rows {
            Some(rows) => summary::head(dataset, rows),
            None => TableView::from_frame(dataset.frame()),
        }
    }

    pub fn describe(&self) -> Result<Describe> {
        summary::describe(self.dataset()?)
    }

    pub fn head(&self, rows: Option<usize>) -> Result<TableView> {
        summary::head(self.dataset()?, rows.unwrap_or(self.config.views.default_rows))
    }

    pub fn tail(&self, rows: Option<usize>) -> Result<TableView> {
        summary::tail(self.dataset()?, rows.unwrap_or(self.config.views.default_rows))
    }

    pub fn dtypes(&self) -> Result<Vec<ColumnType>> {
        Ok(summary::dtypes(self.dataset()?))
    }

    pub fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.dataset()?.column_names())
    }

    pub fn count_values(&self, request: &ValueCountRequest) -> Result<ValueCountResponse> {
        let result = value_counts::count_values(self.dataset()?, request)?;
        let figures = FigureBuilder::new(&self.config.charts).value_counts(&result)?;
        Ok(ValueCountResponse {
            total: result.total()?,
            table: result.to_table()?,
            column: result.column,
            count_column: result.count_column,
            figures,
        })
    }

    /// A rejected request also clears the previous result, so the chart
    /// builder never draws a table that no longer matches the selection.
    pub fn group_by(&mut self, request: &GroupByRequest) -> Result<GroupByResponse> {
        self.group_by = None;
        let result = group_by::group_by(self.dataset()?, request)?;
        let response = GroupByResponse {
            keys: result.keys.clone(),
            target: result.target.clone(),
            operation: result.operation,
            aggregate_column: result.aggregate_column.clone(),
            table: result.to_table()?,
        };
        self.group_by = Some(result);
        Ok(response)
    }

    pub fn group_by_result(&self) -> Option<&GroupByResult> {
        self.group_by.as_ref()
    }

    pub fn build_chart(&self, request: ChartRequest) -> Result<Figure> {
        let result = self
            .group_by
            .as_ref()
            .ok_or(SelectionError::NoGroupByResult)?;
        let spec = request.into_spec(&result.aggregate_column);
        spec.validate(&result.frame, &self.catalogue)?;
        let figure = FigureBuilder::new(&self.config.charts).build(&spec, &result.frame)?;
        debug!(
            family = %spec.family,
            traces = figure.trace_count(),
            "chart built"
        );
        Ok(figure)
    }

    pub fn chart_catalogue(&self) -> &ChartCatalogue {
        &self.catalogue
    }

    pub fn reset(&mut self) {
        if let Some(dataset) = self.dataset.take() {
            info!(file_name = %dataset.metadata().file_name, "session reset");
        }
        self.group_by = None;
    }
}
