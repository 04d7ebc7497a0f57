//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the upstream configuration

use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::BTreeMap;

/// `GET /healthz`
///
/// Liveness probe. Always 200, never touches the network.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Reports whether Google Drive and GitHub are configured. Returns 503 when
/// Drive credentials are missing, since certificates are then demo data.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let drive_check = match state.drive.missing_config() {
        None => CheckStatus { ok: true, error: None },
        Some(missing) => CheckStatus {
            ok: false,
            error: Some(format!("{} is not set", missing)),
        },
    };
    let github_check = if state.github.username().is_empty() {
        CheckStatus {
            ok: false,
            error: Some("GITHUB_USERNAME is empty".into()),
        }
    } else {
        CheckStatus { ok: true, error: None }
    };

    let overall_ok = drive_check.ok && github_check.ok;
    let mut checks = BTreeMap::new();
    checks.insert("google_drive", drive_check);
    checks.insert("github", github_check);

    let body = ReadyResponse {
        status: if overall_ok { "ok".into() } else { "degraded".into() },
        checks,
    };
    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
