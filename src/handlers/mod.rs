use crate::db::{ReportRepository, WarningRepository};
use crate::run;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

pub async fn health_check() -> &'static str {
    "OK"
}

/// Run one reconciliation now; only one run may be in flight at a time
pub async fn trigger_run(State(state): State<Arc<AppState>>) -> Response {
    let Ok(_guard) = state.run_lock.try_lock() else {
        tracing::warn!("Run requested while another run is in progress");
        return (StatusCode::CONFLICT, "A run is already in progress").into_response();
    };

    tracing::info!("Starting triggered run");

    match run::run_once(&state.config, &state.slack_client, state.db_pool.as_ref()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::error!("Run failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

/// Current contents of the warning table
pub async fn list_warnings(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref pool) = state.db_pool else {
        return (StatusCode::NOT_FOUND, "No database configured").into_response();
    };

    match WarningRepository::new(pool.clone()).list().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            tracing::error!("Failed to read warning table: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

/// Current contents of the channel report table
pub async fn list_report(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref pool) = state.db_pool else {
        return (StatusCode::NOT_FOUND, "No database configured").into_response();
    };

    match ReportRepository::new(pool.clone()).list().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            tracing::error!("Failed to read channel report: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
