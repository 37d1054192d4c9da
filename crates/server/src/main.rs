use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use server_api::{
    associate_ticket, change_call_state, create_call, finalize_call, get_call, list_calls,
    ApiContext,
};
use shared::{
    domain::{CallId, OperatorId},
    error::{ApiError, ErrorCode},
    protocol::{
        AssociateTicketRequest, CallRecord, ChangeCallStateRequest, CreateCallRequest,
        FinalizeCallRequest,
    },
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCallsQuery {
    operator_id: Option<i64>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext::new(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "call registry listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/calls", post(http_create_call).get(http_list_calls))
        .route("/calls/:call_id", get(http_get_call))
        .route("/calls/:call_id/state", patch(http_change_call_state))
        .route("/calls/:call_id/finalize", patch(http_finalize_call))
        .route("/calls/:call_id/ticket", patch(http_associate_ticket))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    warn!(%status, message = %err.message, "registry request rejected");
    (status, Json(err))
}

async fn http_create_call(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCallRequest>,
) -> Result<(StatusCode, Json<CallRecord>), (StatusCode, Json<ApiError>)> {
    let call = create_call(&state.api, req.operator_id, &req.origin_number)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(call)))
}

async fn http_list_calls(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListCallsQuery>,
) -> Json<Vec<CallRecord>> {
    Json(list_calls(&state.api, q.operator_id.map(OperatorId)).await)
}

async fn http_get_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<i64>,
) -> ApiResult<CallRecord> {
    get_call(&state.api, CallId(call_id))
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_change_call_state(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<i64>,
    Json(req): Json<ChangeCallStateRequest>,
) -> ApiResult<CallRecord> {
    change_call_state(&state.api, CallId(call_id), req.state)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_finalize_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<i64>,
    Json(req): Json<FinalizeCallRequest>,
) -> ApiResult<CallRecord> {
    finalize_call(&state.api, CallId(call_id), req.duration_seconds)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_associate_ticket(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<i64>,
    Json(req): Json<AssociateTicketRequest>,
) -> ApiResult<CallRecord> {
    associate_ticket(&state.api, CallId(call_id), req.ticket_id)
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
