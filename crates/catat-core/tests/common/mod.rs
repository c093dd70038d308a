//! Mock Google server for integration tests
//!
//! Serves the two APIs the pipeline talks to on an ephemeral port:
//! - Gemini `models/{model}:generateContent` (and `models/{model}` for health)
//! - Sheets v4 `values:append` and `values.get`
//!
//! Responses are scripted per test and every request is recorded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Default)]
struct MockState {
    candidates: Vec<String>,
    gemini_status: Option<u16>,
    gemini_requests: Vec<Value>,
    append_status: Option<u16>,
    appended: Vec<Vec<String>>,
    append_queries: Vec<HashMap<String, String>>,
    authorizations: Vec<String>,
    summary: Vec<Vec<Value>>,
    summary_status: Option<u16>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockGoogleServer {
    addr: SocketAddr,
    state: Shared,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGoogleServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/v1beta/models/:call", post(handle_generate).get(handle_model))
            .route(
                "/v4/spreadsheets/:id/values/:range",
                post(handle_append).get(handle_values),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn gemini_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    pub fn sheets_url(&self) -> String {
        format!("http://{}/v4", self.addr)
    }

    /// Candidate texts returned by generateContent, one candidate each
    pub fn set_candidates(&self, texts: &[&str]) {
        self.state.lock().unwrap().candidates = texts.iter().map(|t| t.to_string()).collect();
    }

    pub fn fail_gemini(&self, status: u16) {
        self.state.lock().unwrap().gemini_status = Some(status);
    }

    pub fn fail_append(&self, status: u16) {
        self.state.lock().unwrap().append_status = Some(status);
    }

    pub fn fail_summary(&self, status: u16) {
        self.state.lock().unwrap().summary_status = Some(status);
    }

    /// Rows returned for the summary range; cells may be strings or numbers
    pub fn set_summary(&self, rows: Value) {
        let rows = serde_json::from_value(rows).unwrap();
        self.state.lock().unwrap().summary = rows;
    }

    pub fn appended(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().appended.clone()
    }

    pub fn append_queries(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().unwrap().append_queries.clone()
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.lock().unwrap().authorizations.clone()
    }

    pub fn gemini_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().gemini_requests.clone()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGoogleServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn failure(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": "scripted failure"}})),
    )
        .into_response()
}

/// generateContent: answers with the scripted candidates
async fn handle_generate(
    State(state): State<Shared>,
    Path(call): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.gemini_requests.push(body);
    if let Some(status) = state.gemini_status {
        return failure(status);
    }
    if !call.ends_with(":generateContent") {
        return failure(404);
    }
    let candidates: Vec<Value> = state
        .candidates
        .iter()
        .map(|text| {
            json!({
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            })
        })
        .collect();
    Json(json!({
        "candidates": candidates,
        "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40}
    }))
    .into_response()
}

/// models.get, used as the health check
async fn handle_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({"name": format!("models/{}", model)}))
}

/// values:append
async fn handle_append(
    State(state): State<Shared>,
    Path((_id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorizations.push(auth.to_string());
    }
    if let Some(status) = state.append_status {
        return failure(status);
    }
    if !range.ends_with(":append") {
        return failure(404);
    }
    state.append_queries.push(query);
    let rows: Vec<Vec<String>> = serde_json::from_value(body["values"].clone()).unwrap_or_default();
    let updated = rows.len();
    state.appended.extend(rows);
    Json(json!({
        "updates": {"updatedRange": range.trim_end_matches(":append"), "updatedRows": updated}
    }))
    .into_response()
}

/// values.get for the summary window
async fn handle_values(
    State(state): State<Shared>,
    Path((_id, range)): Path<(String, String)>,
) -> Response {
    let state = state.lock().unwrap();
    if let Some(status) = state.summary_status {
        return failure(status);
    }
    if state.summary.is_empty() {
        // The API omits `values` for an empty range
        return Json(json!({"range": range, "majorDimension": "ROWS"})).into_response();
    }
    Json(json!({"range": range, "majorDimension": "ROWS", "values": state.summary})).into_response()
}
