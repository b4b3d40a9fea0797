//! # Status Handler
//!
//! Liveness plus database reachability, for load balancers and operators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use vitrine_db::migrations::migration_status;

use crate::state::AppState;

/// `GET /status` - 200 when the database answers, 503 otherwise.
pub async fn status(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();

    if !state.db.health_check().await {
        warn!("Status check: database unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "database": "disconnected",
                "service": env!("CARGO_PKG_NAME"),
                "timestamp": timestamp,
            })),
        );
    }

    let migrations = match migration_status(state.db.pool()).await {
        Ok(status) => json!({
            "total": status.total,
            "applied": status.applied,
            "current": status.is_current(),
        }),
        Err(e) => {
            warn!(error = %e, "Status check: migration state unreadable");
            Value::Null
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "database": "connected",
            "migrations": migrations,
            "fulfillment_timeout_ms": state.config.fulfillment_timeout_ms,
            "max_connections": state.config.max_connections,
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": timestamp,
        })),
    )
}
