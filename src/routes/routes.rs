//! Route table for the portfolio API.
//!
//! ## Structure
//! - **Health**: `GET /healthz`, `GET /readyz`
//! - **Certificates** (`/api/certificates`)
//!   - `GET    /` - certificates with matched assets
//!   - `GET    /sheet` - spreadsheet rows only
//!   - `GET    /files` - image/PDF assets in the folder
//!   - `GET    /status` - Drive configuration probe
//!   - `POST   /cache/clear` - drop every cached payload
//!   - `DELETE /cache/{resource}` - drop one cached resource
//! - **GitHub** (`/api/github`): user, repositories, per-repository details,
//!   stats and activity
//! - **Profile**: `GET /api/profile`

use crate::{
    AppState,
    handlers::{
        certificate_handlers::{
            certificate_files, certificates_sheet, clear_cache, configuration_status,
            invalidate_cache, list_certificates,
        },
        github_handlers::{
            contribution_activity, get_user, list_repositories, pinned_repositories,
            repository_commits, repository_languages, repository_readme, search_repositories,
            user_stats,
        },
        health_handlers::{healthz, readyz},
        profile_handlers::get_profile,
    },
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build and return the router with every API route.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/certificates", certificate_routes())
        .nest("/api/github", github_routes())
        .route("/api/profile", get(get_profile))
}

fn certificate_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_certificates))
        .route("/sheet", get(certificates_sheet))
        .route("/files", get(certificate_files))
        .route("/status", get(configuration_status))
        .route("/cache/clear", post(clear_cache))
        .route("/cache/{resource}", delete(invalidate_cache))
}

fn github_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(get_user))
        .route("/repos", get(list_repositories))
        // static segments take priority over `{owner}` captures
        .route("/repos/pinned", get(pinned_repositories))
        .route("/repos/search", get(search_repositories))
        .route("/repos/{owner}/{repo}/languages", get(repository_languages))
        .route("/repos/{owner}/{repo}/commits", get(repository_commits))
        .route("/repos/{owner}/{repo}/readme", get(repository_readme))
        .route("/stats", get(user_stats))
        .route("/activity", get(contribution_activity))
}
