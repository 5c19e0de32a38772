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

use super::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

/// `body_limit` caps upload size in bytes; `None` lifts axum's default cap.
pub fn build_router(state: AppState, body_limit: Option<usize>) -> Router {
    let limit = match body_limit {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/api/dataset",
            get(handlers::preview)
                .post(handlers::upload_dataset)
                .delete(handlers::clear_dataset),
        )
        .route("/api/dataset/overview", get(handlers::overview))
        .route("/api/dataset/describe", get(handlers::describe))
        .route("/api/dataset/head", get(handlers::head))
        .route("/api/dataset/tail", get(handlers::tail))
        .route("/api/dataset/dtypes", get(handlers::dtypes))
        .route("/api/dataset/columns", get(handlers::columns))
        .route("/api/value-counts", post(handlers::value_counts))
        .route("/api/group-by", post(handlers::group_by))
        .route(
            "/api/charts",
            get(handlers::chart_catalogue).post(handlers::build_chart),
        )
        .layer(limit)
        .with_state(state)
}
