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

pub mod charts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod group_by;
pub mod ingest;
pub mod session;
pub mod summary;
pub mod table;
pub mod value_counts;

pub use charts::{ChartCatalogue, ChartFamily, ChartRequest, ChartSpec, Figure, Role};
pub use config::{PortalConfig, DEFAULT_CONFIG_PATH};
pub use dataset::{ColumnKind, Dataset, DatasetId, DatasetMetadata};
pub use error::{
    AggregationError, ChartError, ConfigError, IngestError, PortalError, Result, SelectionError,
};
pub use group_by::{AggregateOp, GroupByRequest, GroupByResult};
pub use session::{GroupByResponse, Session, ValueCountResponse};
pub use table::TableView;
pub use value_counts::{ValueCountRequest, ValueCountResult};
