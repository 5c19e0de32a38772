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

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use data_portal::{http::build_router, AppState};
use portal::{PortalConfig, Session};
use serde_json::{json, Value};
use tower::ServiceExt;

const SALES: &str = "city,sales\nA,10\nB,20\nA,30\n";

fn app() -> Router {
    let session = Session::new(PortalConfig::default()).unwrap();
    build_router(AppState::new(session), None)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload(app: &Router) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/api/dataset?file_name=sales.csv")
        .body(Body::from(SALES))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_healthz() {
    let (status, body) = send(&app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dataset_loaded"], false);
}

#[tokio::test]
async fn test_index_page_is_served() {
    let response = app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("plotly"));
}

#[tokio::test]
async fn test_index_page_refreshes_on_change() {
    let response = app().oneshot(get("/")).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8_lossy(&bytes);

    assert!(page.contains(r#"id="head-rows" value="5" min="1""#));
    assert!(page.contains(r#"id="tail-rows" value="5" min="1""#));
    assert!(page.contains(r#"$("head-rows").addEventListener("change", () => showView("head"))"#));
    assert!(page.contains(r#"$("tail-rows").addEventListener("change", () => showView("tail"))"#));
    assert!(page.contains(r#"["gb-keys", "gb-target", "gb-op"].forEach((id) => $(id).addEventListener("change", runGroupBy))"#));
    assert!(page.contains(r#"select.addEventListener("change", drawChart)"#));
    assert!(page.contains("File is successfully uploaded"));
    assert!(!page.contains("view-rows"));
    assert!(!page.contains("gb-run"));
    assert!(!page.contains("cb-run"));
}

#[tokio::test]
async fn test_views_before_upload_conflict() {
    let (status, body) = send(&app(), get("/api/dataset/describe")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_DATASET");
    assert_eq!(body["category"], "Selection");
}

#[tokio::test]
async fn test_upload_and_summaries() {
    let app = app();
    let overview = upload(&app).await;
    assert_eq!(overview["shape"], json!({ "rows": 3, "columns": 2 }));

    let (_, columns) = send(&app, get("/api/dataset/columns")).await;
    assert_eq!(columns, json!(["city", "sales"]));

    let (_, head) = send(&app, get("/api/dataset/head?rows=2")).await;
    assert_eq!(head["rows"].as_array().unwrap().len(), 2);

    let (_, tail) = send(&app, get("/api/dataset/tail?rows=1")).await;
    assert_eq!(tail["rows"], json!([["A", 30]]));

    let (status, describe) = send(&app, get("/api/dataset/describe")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(describe["summary"]["kind"], "numeric");
}

#[tokio::test]
async fn test_preview_returns_whole_table() {
    let app = app();
    upload(&app).await;
    let (status, preview) = send(&app, get("/api/dataset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["rows"], json!([["A", 10], ["B", 20], ["A", 30]]));
}

#[tokio::test]
async fn test_head_and_tail_take_their_own_row_counts() {
    let app = app();
    upload(&app).await;
    let (_, head) = send(&app, get("/api/dataset/head?rows=1")).await;
    let (_, tail) = send(&app, get("/api/dataset/tail?rows=2")).await;
    assert_eq!(head["rows"], json!([["A", 10]]));
    assert_eq!(tail["rows"], json!([["B", 20], ["A", 30]]));
}

#[tokio::test]
async fn test_clear_dataset() {
    let app = app();
    upload(&app).await;
    let (_, health) = send(&app, get("/healthz")).await;
    assert_eq!(health["dataset_loaded"], true);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/dataset")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cleared");

    let (_, health) = send(&app, get("/healthz")).await;
    assert_eq!(health["dataset_loaded"], false);
    let (status, body) = send(&app, get("/api/dataset/head")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_DATASET");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_requests_on_blocking_pool() {
    let app = app();
    upload(&app).await;
    let group = json!({ "group_by": ["city"], "target": "sales", "operation": "max" });
    let counts = json!({ "column": "city", "top_rows": 5 });
    let (
        (describe_status, _),
        (group_status, grouped),
        (counts_status, counted),
        (health_status, _),
    ) = tokio::join!(
        send(&app, get("/api/dataset/describe")),
        send(&app, post_json("/api/group-by", group)),
        send(&app, post_json("/api/value-counts", counts)),
        send(&app, get("/healthz")),
    );
    assert_eq!(describe_status, StatusCode::OK);
    assert_eq!(group_status, StatusCode::OK);
    assert_eq!(grouped["table"]["rows"], json!([["A", 30], ["B", 20]]));
    assert_eq!(counts_status, StatusCode::OK);
    assert_eq!(counted["total"], 3);
    assert_eq!(health_status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_file_name() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/dataset")
        .body(Body::from(SALES))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FILE_NAME");
}

#[tokio::test]
async fn test_unparseable_spreadsheet() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/dataset?file_name=book.xlsx")
        .body(Body::from("not a workbook"))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_value_counts_endpoint() {
    let app = app();
    upload(&app).await;
    let (status, body) = send(
        &app,
        post_json("/api/value-counts", json!({ "column": "city", "top_rows": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"]["rows"], json!([["A", 2]]));
    assert_eq!(body["figures"]["pie"]["data"][0]["type"], "pie");
}

#[tokio::test]
async fn test_group_by_then_chart() {
    let app = app();
    upload(&app).await;
    let (status, body) = send(
        &app,
        post_json(
            "/api/group-by",
            json!({ "group_by": ["city"], "target": "sales", "operation": "sum" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"]["rows"], json!([["A", 40], ["B", 20]]));

    let (status, figure) = send(
        &app,
        post_json(
            "/api/charts",
            json!({ "family": "bar", "x": "city", "y": "newcol" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(figure["data"][0]["y"], json!([40, 20]));
}

#[tokio::test]
async fn test_chart_with_unknown_column() {
    let app = app();
    upload(&app).await;
    send(
        &app,
        post_json(
            "/api/group-by",
            json!({ "group_by": ["city"], "target": "sales", "operation": "mean" }),
        ),
    )
    .await;
    let (status, body) = send(
        &app,
        post_json(
            "/api/charts",
            json!({ "family": "line", "x": "region", "y": "newcol" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COLUMN_NOT_FOUND");
}

#[tokio::test]
async fn test_sum_of_text_column() {
    let app = app();
    upload(&app).await;
    let (status, body) = send(
        &app,
        post_json(
            "/api/group-by",
            json!({ "group_by": ["sales"], "target": "city", "operation": "sum" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["category"], "Aggregation");
}

#[tokio::test]
async fn test_catalogue_endpoint() {
    let (status, body) = send(&app(), get("/api/charts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
    assert_eq!(body[4]["family"], "sunburst");
}
