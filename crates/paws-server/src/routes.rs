//! HTTP routes
//!
//! `/paws` carries the device protocol as JSON-RPC; `/admin/*` is the
//! operator surface for incumbents, exclusions and interference reports.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use paws_core::paws::{
    DeleteIncumbentRequest, ExcludeChannelsRequest, ExcludeIdsRequest, InterferenceQueryRequest,
};
use paws_core::{
    BroadcastStation, IncumbentParameters, IncumbentRegistration, IncumbentType, InitializedDevice,
    LpAuxLicenseInfo, RegistrationResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::rpc::{self, RpcRequest, RpcResponse};
use crate::state::SharedState;

/// Header naming the operator on admin requests
pub const USER_HEADER: &str = "x-user-id";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncumbentQuery {
    #[serde(rename = "type")]
    kind: IncumbentType,
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct LicenseQuery {
    #[serde(default)]
    licensed: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    org_code: String,
    region_key: String,
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/paws", post(paws_rpc))
        .route("/admin/incumbents", get(list_incumbents).post(register_incumbent))
        .route("/admin/incumbents/delete", post(delete_incumbent))
        .route("/admin/exclusions/ids", post(exclude_ids))
        .route("/admin/exclusions/channels", post(exclude_channels))
        .route("/admin/interference", post(interference_query))
        .route("/admin/devices", get(list_devices))
        .route("/admin/devices/:device_id", get(device_info))
        .route("/admin/licenses", get(lp_aux_licenses))
        .route("/admin/callsigns/:call_sign", get(mvpd_call_sign_info))
        .with_state(state)
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let config = state.engine.config();
    Json(HealthResponse {
        status: "ok",
        org_code: config.org_code.clone(),
        region_key: config.region_key.clone(),
    })
}

async fn render_metrics(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let handle = state.metrics.as_ref().ok_or(ServerError::MetricsDisabled)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

/// Raw body so malformed envelopes get a JSON-RPC parse error, not a 4xx
async fn paws_rpc(State(state): State<SharedState>, body: String) -> Json<RpcResponse> {
    let request: RpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => return Json(RpcResponse::parse_error(e.to_string())),
    };
    Json(rpc::dispatch(&state.engine, request).await)
}

fn user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("admin")
        .to_string()
}

/// Count the call and any engine failure under `method`
fn observe<T>(method: &'static str, started: Instant, result: &paws_core::Result<T>) {
    metrics::record_request(method, started.elapsed().as_secs_f64());
    if let Err(e) = result {
        paws_engine::boundary::log_failure(method, e);
        metrics::record_error(method, e.status_code());
    }
}

async fn register_incumbent(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(params): Json<IncumbentParameters>,
) -> Result<Json<RegistrationResult>> {
    let started = Instant::now();
    let ctx = state.engine.context();
    let result = state
        .engine
        .register_incumbent(&ctx, params, &user_id(&headers))
        .await;
    observe("registerIncumbent", started, &result);
    Ok(Json(result?))
}

async fn delete_incumbent(
    State(state): State<SharedState>,
    Json(request): Json<DeleteIncumbentRequest>,
) -> Result<Json<Value>> {
    let started = Instant::now();
    let result = state.engine.delete_incumbent_info(&request).await;
    observe("deleteIncumbentInfo", started, &result);
    let outcome = result?;
    Ok(Json(json!({ "result": outcome.to_string(), "outcome": outcome })))
}

async fn exclude_ids(
    State(state): State<SharedState>,
    Json(request): Json<ExcludeIdsRequest>,
) -> Result<Json<Value>> {
    let started = Instant::now();
    let result = state.engine.exclude_ids(&state.engine.context(), &request).await;
    observe("excludeIds", started, &result);
    Ok(Json(json!({ "rowKey": result? })))
}

async fn exclude_channels(
    State(state): State<SharedState>,
    Json(request): Json<ExcludeChannelsRequest>,
) -> Result<Json<Value>> {
    let started = Instant::now();
    let result = state
        .engine
        .exclude_channels(&state.engine.context(), &request)
        .await;
    observe("excludeChannels", started, &result);
    Ok(Json(json!({ "rowKey": result? })))
}

/// Responds with the number of rows reported; failures carry the generic
/// PAWS status in the error body.
async fn interference_query(
    State(state): State<SharedState>,
    Json(request): Json<InterferenceQueryRequest>,
) -> Result<Json<Value>> {
    let started = Instant::now();
    let ctx = state.engine.context();
    let result = state.engine.interference_query(&ctx, &request).await;
    observe("interferenceQuery", started, &result);
    let report = result?;
    Ok(Json(json!({
        "code": report.rows.len(),
        "report": report.path.display().to_string(),
        "generatedAt": report.generated_at,
        "rows": report.rows,
    })))
}

async fn list_incumbents(
    State(state): State<SharedState>,
    Query(query): Query<IncumbentQuery>,
) -> Result<Json<Vec<IncumbentRegistration>>> {
    let started = Instant::now();
    let result = state
        .engine
        .get_incumbents(query.kind, query.user_id.as_deref())
        .await;
    observe("getIncumbents", started, &result);
    Ok(Json(result?))
}

async fn list_devices(State(state): State<SharedState>) -> Result<Json<Vec<InitializedDevice>>> {
    let started = Instant::now();
    let result = state.engine.get_devices().await;
    observe("getDevices", started, &result);
    Ok(Json(result?))
}

async fn device_info(
    State(state): State<SharedState>,
    Path(device_id): Path<String>,
) -> Result<Json<InitializedDevice>> {
    let started = Instant::now();
    let result = state.engine.get_device_info(&device_id).await;
    observe("getDeviceInfo", started, &result);
    Ok(Json(result?))
}

async fn lp_aux_licenses(
    State(state): State<SharedState>,
    Query(query): Query<LicenseQuery>,
) -> Result<Json<Vec<LpAuxLicenseInfo>>> {
    let started = Instant::now();
    let result = state.engine.get_lp_aux_license_info(query.licensed).await;
    observe("getLpAuxLicenseInfo", started, &result);
    Ok(Json(result?))
}

async fn mvpd_call_sign_info(
    State(state): State<SharedState>,
    Path(call_sign): Path<String>,
) -> Result<Json<Vec<BroadcastStation>>> {
    let started = Instant::now();
    let result = state.engine.get_mvpd_call_sign_info(&call_sign).await;
    observe("getMvpdCallSignInfo", started, &result);
    Ok(Json(result?))
}
