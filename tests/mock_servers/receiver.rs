//! Mock receiver API
//!
//! Serves `/profile`, `/device`, `/volume`, `/subwoofer` and `/power` the way the
//! receiver bridge does, with knobs for latency, status codes and broken bodies.

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Json, Router,
};
use receiver_remote::DeviceState;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// A request the mock has seen
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub params: HashMap<String, String>,
}

struct MockReceiverState {
    device: DeviceState,
    profiles: HashMap<String, DeviceState>,
    query_delay: Duration,
    command_delay: Duration,
    query_status: Option<StatusCode>,
    command_status: Option<StatusCode>,
    query_body: Option<String>,
    query_redirect: Option<String>,
    powered: bool,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<RwLock<MockReceiverState>>;

fn profile(name: &str, volume_level: i32, subwoofer_level: i32, max_volume: i32) -> DeviceState {
    DeviceState {
        profile: name.to_string(),
        volume_level,
        subwoofer_level,
        max_volume,
    }
}

/// Mock receiver server
pub struct MockReceiver {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockReceiver {
    /// Start a mock receiver on a random port reporting `device`
    pub async fn start(device: DeviceState) -> Self {
        let profiles = [
            profile("tv", 20, 0, 28),
            profile("dj", 27, -8, 35),
            profile("vinyl", 20, 0, 30),
            profile("spotify", 38, -6, 50),
        ]
        .into_iter()
        .map(|p| (p.profile.clone(), p))
        .collect();

        let state = Arc::new(RwLock::new(MockReceiverState {
            device,
            profiles,
            query_delay: Duration::ZERO,
            command_delay: Duration::ZERO,
            query_status: None,
            command_status: None,
            query_body: None,
            query_redirect: None,
            powered: true,
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/profile", get(handle_state).put(handle_select_profile))
            .route("/device", get(handle_state))
            .route("/volume", put(handle_set_volume))
            .route("/volume/up", put(handle_step))
            .route("/volume/down", put(handle_step))
            .route("/subwoofer", put(handle_set_subwoofer))
            .route("/subwoofer/up", put(handle_step))
            .route("/subwoofer/down", put(handle_step))
            .route("/power", get(handle_power_status))
            .route("/power/on", put(handle_power))
            .route("/power/off", put(handle_power))
            .route("/power/switch", put(handle_power))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, handle }
    }

    /// Base URL for controller configuration
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn set_device(&self, device: DeviceState) {
        self.state.write().await.device = device;
    }

    pub async fn device(&self) -> DeviceState {
        self.state.read().await.device.clone()
    }

    /// Delay every state query response
    pub async fn set_query_delay(&self, delay: Duration) {
        self.state.write().await.query_delay = delay;
    }

    /// Delay every command response
    pub async fn set_command_delay(&self, delay: Duration) {
        self.state.write().await.command_delay = delay;
    }

    /// Answer state queries with this status instead of 200
    pub async fn fail_queries(&self, status: StatusCode) {
        self.state.write().await.query_status = Some(status);
    }

    /// Answer commands with this status instead of 200
    pub async fn fail_commands(&self, status: StatusCode) {
        self.state.write().await.command_status = Some(status);
    }

    /// Answer state queries with a raw body
    pub async fn set_query_body(&self, body: &str) {
        self.state.write().await.query_body = Some(body.to_string());
    }

    /// Answer state queries with a `307` to `location`
    pub async fn redirect_queries(&self, location: &str) {
        self.state.write().await.query_redirect = Some(location.to_string());
    }

    /// Undo every query knob: delay, status, body and redirect
    pub async fn clear_query_faults(&self) {
        let mut s = self.state.write().await;
        s.query_delay = Duration::ZERO;
        s.query_status = None;
        s.query_body = None;
        s.query_redirect = None;
    }

    pub async fn set_powered(&self, powered: bool) {
        self.state.write().await.powered = powered;
    }

    pub async fn powered(&self) -> bool {
        self.state.read().await.powered
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn record(state: &Shared, method: &'static str, uri: &Uri, params: &HashMap<String, String>) {
    state.write().await.requests.push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        params: params.clone(),
    });
}

/// Wait out the query delay, then answer with the configured failure or body
async fn query_response(state: &Shared) -> Option<Response> {
    let (delay, status, body, redirect) = {
        let s = state.read().await;
        (s.query_delay, s.query_status, s.query_body.clone(), s.query_redirect.clone())
    };
    tokio::time::sleep(delay).await;

    if let Some(location) = redirect {
        return Some(Redirect::temporary(&location).into_response());
    }

    if let Some(status) = status {
        return Some((status, "receiver unavailable").into_response());
    }
    body.map(|body| (StatusCode::OK, body).into_response())
}

async fn command_response(state: &Shared) -> Option<Response> {
    let (delay, status) = {
        let s = state.read().await;
        (s.command_delay, s.command_status)
    };
    tokio::time::sleep(delay).await;
    status.map(|status| (status, "command failed").into_response())
}

async fn handle_state(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "GET", &uri, &params).await;
    if let Some(response) = query_response(&state).await {
        return response;
    }
    Json(state.read().await.device.clone()).into_response()
}

async fn handle_select_profile(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "PUT", &uri, &params).await;
    if let Some(response) = query_response(&state).await {
        return response;
    }

    let name = params.get("name").cloned().unwrap_or_default();
    let mut s = state.write().await;
    match s.profiles.get(&name).cloned() {
        Some(selected) => {
            s.device = selected.clone();
            Json(selected).into_response()
        }
        None => (StatusCode::BAD_REQUEST, format!("profile '{}' does not exist", name)).into_response(),
    }
}

fn parse_level(params: &HashMap<String, String>) -> Option<i32> {
    params.get("level").and_then(|l| l.parse().ok())
}

async fn handle_set_volume(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "PUT", &uri, &params).await;
    if let Some(response) = command_response(&state).await {
        return response;
    }
    match parse_level(&params) {
        Some(level) => {
            state.write().await.device.volume_level = level;
            format!("Volume set to {}", level).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "invalid volume level format").into_response(),
    }
}

async fn handle_set_subwoofer(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "PUT", &uri, &params).await;
    if let Some(response) = command_response(&state).await {
        return response;
    }
    match parse_level(&params) {
        Some(level) => {
            state.write().await.device.subwoofer_level = level;
            format!("Subwoofer level set to {}", level).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "invalid subwoofer level format").into_response(),
    }
}

async fn handle_step(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "PUT", &uri, &params).await;
    if let Some(response) = command_response(&state).await {
        return response;
    }
    format!("OK {}", uri.path()).into_response()
}

async fn handle_power_status(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "GET", &uri, &params).await;
    if let Some(response) = query_response(&state).await {
        return response;
    }
    Json(json!({ "is_powered": state.read().await.powered })).into_response()
}

async fn handle_power(
    State(state): State<Shared>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "PUT", &uri, &params).await;
    if let Some(response) = command_response(&state).await {
        return response;
    }
    let mut s = state.write().await;
    s.powered = match uri.path() {
        "/power/on" => true,
        "/power/off" => false,
        _ => !s.powered,
    };
    Json(json!({ "is_powered": s.powered })).into_response()
}
