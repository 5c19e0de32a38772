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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use portal::{AggregationError, ChartError, PortalError, SelectionError};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub category: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            category: "Request".to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// A handler task that panicked or was cancelled before it produced a result.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            category: "Server".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PortalError> for ApiError {
    fn from(e: PortalError) -> Self {
        let (status, code) = match &e {
            PortalError::Selection(SelectionError::NoDataset) => {
                (StatusCode::CONFLICT, "NO_DATASET")
            }
            PortalError::Selection(SelectionError::NoGroupByResult) => {
                (StatusCode::CONFLICT, "NO_GROUP_BY_RESULT")
            }
            PortalError::Selection(SelectionError::ColumnNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "COLUMN_NOT_FOUND")
            }
            PortalError::Selection(SelectionError::NoGroupingColumns) => {
                (StatusCode::BAD_REQUEST, "NO_GROUPING_COLUMNS")
            }
            PortalError::Selection(SelectionError::InvalidRowLimit { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_ROW_LIMIT")
            }
            PortalError::Ingest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PARSE_ERROR"),
            PortalError::Aggregation(AggregationError::UnknownOperation { .. }) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_OPERATION")
            }
            PortalError::Aggregation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "AGGREGATION_TYPE_ERROR")
            }
            PortalError::Chart(ChartError::UnknownColumn { .. }) => {
                (StatusCode::NOT_FOUND, "COLUMN_NOT_FOUND")
            }
            PortalError::Chart(ChartError::InvalidCatalogue { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_CATALOGUE")
            }
            PortalError::Chart(ChartError::DataTypeMismatch { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CHART_TYPE_ERROR")
            }
            PortalError::Chart(_) => (StatusCode::BAD_REQUEST, "INVALID_CHART"),
            PortalError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            PortalError::Polars(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATA_ERROR"),
        };
        if !e.is_recoverable() {
            error!(category = e.category(), error = %e, "unrecoverable portal error");
        } else if status.is_server_error() {
            warn!(category = e.category(), error = %e, "request failed");
        }
        Self {
            code: code.to_string(),
            message: e.user_message(),
            category: e.category().to_string(),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(self);
        (status, body).into_response()
    }
}
