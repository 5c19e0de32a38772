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

use super::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{Html, Json};
use portal::charts::{ChartEntry, Figure};
use portal::summary::{ColumnType, DatasetOverview};
use portal::{
    ChartRequest, GroupByRequest, GroupByResponse, Session, TableView, ValueCountRequest,
    ValueCountResponse,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::info;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Runs `work` on the blocking pool with the session read lock held.
async fn read_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&Session) -> portal::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let guard = state.session.clone().read_owned().await;
    tokio::task::spawn_blocking(move || work(&*guard))
        .await
        .map_err(|e| ApiError::internal(format!("session task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Runs `work` on the blocking pool with the session write lock held.
async fn write_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> portal::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let mut guard = state.session.clone().write_owned().await;
    tokio::task::spawn_blocking(move || work(&mut *guard))
        .await
        .map_err(|e| ApiError::internal(format!("session task failed: {e}")))?
        .map_err(ApiError::from)
}

const INDEX_HTML: &str = include_str!("../../assets/index.html");

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RowParams {
    pub rows: Option<usize>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn healthz(State(state): State<AppState>) -> Json<JsonValue> {
    let dataset_loaded = state.session.read().await.has_dataset();
    Json(json!({ "status": "ok", "dataset_loaded": dataset_loaded }))
}

pub async fn upload_dataset(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ApiResult<DatasetOverview> {
    let file_name = params
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_FILE_NAME", "Add ?file_name= to the upload"))?;
    if body.is_empty() {
        return Err(ApiError::bad_request("EMPTY_UPLOAD", "The uploaded file is empty"));
    }
    let size = body.len();
    let name = file_name.clone();
    let overview = write_blocking(&state, move |session| session.upload(&name, &body)).await?;
    info!(file_name = %file_name, bytes = size, "upload accepted");
    Ok(Json(overview))
}

pub async fn clear_dataset(State(state): State<AppState>) -> Json<JsonValue> {
    state.session.write().await.reset();
    Json(json!({ "status": "cleared" }))
}

pub async fn preview(State(state): State<AppState>) -> ApiResult<TableView> {
    Ok(Json(read_blocking(&state, Session::preview).await?))
}

pub async fn overview(State(state): State<AppState>) -> ApiResult<DatasetOverview> {
    Ok(Json(state.session.read().await.overview()?))
}

pub async fn describe(State(state): State<AppState>) -> ApiResult<JsonValue> {
    let summary = read_blocking(&state, Session::describe).await?;
    let table = summary.to_table();
    Ok(Json(json!({ "summary": summary, "table": table })))
}

pub async fn head(
    State(state): State<AppState>,
    Query(params): Query<RowParams>,
) -> ApiResult<TableView> {
    Ok(Json(state.session.read().await.head(params.rows)?))
}

pub async fn tail(
    State(state): State<AppState>,
    Query(params): Query<RowParams>,
) -> ApiResult<TableView> {
    Ok(Json(state.session.read().await.tail(params.rows)?))
}

pub async fn dtypes(State(state): State<AppState>) -> ApiResult<Vec<ColumnType>> {
    Ok(Json(state.session.read().await.dtypes()?))
}

pub async fn columns(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.session.read().await.column_names()?))
}

pub async fn value_counts(
    State(state): State<AppState>,
    Json(request): Json<ValueCountRequest>,
) -> ApiResult<ValueCountResponse> {
    let response = read_blocking(&state, move |session| session.count_values(&request)).await?;
    Ok(Json(response))
}

pub async fn group_by(
    State(state): State<AppState>,
    Json(request): Json<GroupByRequest>,
) -> ApiResult<GroupByResponse> {
    let response = write_blocking(&state, move |session| session.group_by(&request)).await?;
    Ok(Json(response))
}

pub async fn chart_catalogue(State(state): State<AppState>) -> Json<Vec<ChartEntry>> {
    Json(state.session.read().await.chart_catalogue().entries().to_vec())
}

pub async fn build_chart(
    State(state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> ApiResult<Figure> {
    let figure = read_blocking(&state, move |session| session.build_chart(request)).await?;
    Ok(Json(figure))
}
