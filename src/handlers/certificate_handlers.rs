//! Certificate endpoints. Reads never fail: the service degrades to cached
//! or demo data, so these handlers only shape the JSON.

use crate::{
    AppState,
    errors::AppError,
    models::{certificate::Certificate, drive_file::DriveFile},
    services::drive_service::{CacheResource, ConfigurationReport},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct CacheInvalidation {
    pub resource: CacheResource,
    pub removed: usize,
}

/// `GET /api/certificates`
pub async fn list_certificates(State(state): State<AppState>) -> Json<Vec<Certificate>> {
    Json(state.drive.get_certificates_with_images().await)
}

/// `GET /api/certificates/sheet` - spreadsheet rows without asset matching.
pub async fn certificates_sheet(State(state): State<AppState>) -> Json<Vec<Certificate>> {
    Json(state.drive.get_certificates_sheet().await)
}

/// `GET /api/certificates/files`
pub async fn certificate_files(State(state): State<AppState>) -> Json<Vec<DriveFile>> {
    Json(state.drive.get_certificate_images().await)
}

/// `GET /api/certificates/status`
pub async fn configuration_status(State(state): State<AppState>) -> Json<ConfigurationReport> {
    Json(state.drive.test_configuration().await)
}

/// `POST /api/certificates/cache/clear`
///
/// Also drops the cached GitHub profile and repository lists.
pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.drive.clear_cache();
    state.github.clear_cache();
    StatusCode::NO_CONTENT
}

/// `DELETE /api/certificates/cache/{resource}`
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<CacheInvalidation>, AppError> {
    let resource: CacheResource = resource.parse().map_err(AppError::bad_request)?;
    let removed = state.drive.invalidate(resource);
    Ok(Json(CacheInvalidation { resource, removed }))
}
