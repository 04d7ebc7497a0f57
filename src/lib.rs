//! Portfolio backend.
//!
//! Serves the certificates kept in a Google Drive folder (spreadsheet rows
//! reconciled with the scanned certificate files) and the owner's public
//! GitHub projects to the static portfolio frontend.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header},
};
use config::AppConfig;
use models::profile::ContactProfile;
use services::{
    drive_service::{DriveEndpoints, DriveService, DriveSettings},
    github_service::{GithubService, GithubSettings},
    matcher::Matcher,
    sheet_parser::SheetParser,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub drive: DriveService,
    pub github: GithubService,
    pub profile: Arc<ContactProfile>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Self::with_endpoints(cfg, DriveEndpoints::default(), GithubSettings::DEFAULT_API_BASE)
    }

    /// Build the state against custom upstream base URLs.
    pub fn with_endpoints(
        cfg: &AppConfig,
        drive_endpoints: DriveEndpoints,
        github_api_base: &str,
    ) -> Result<Self> {
        let drive = DriveService::new(
            DriveSettings {
                api_key: cfg.drive_api_key.clone(),
                folder_id: cfg.drive_folder_id.clone(),
                cache_ttl: cfg.cache_ttl,
                endpoints: drive_endpoints,
            },
            SheetParser::new(cfg.column_mapping.clone()),
            Matcher::new(cfg.matcher.clone()),
        )
        .context("building Google Drive client")?;

        let github = GithubService::new(GithubSettings {
            username: cfg.github_username.clone(),
            token: cfg.github_token.clone(),
            api_base: github_api_base.trim_end_matches('/').to_string(),
            cache_ttl: cfg.cache_ttl,
        })
        .context("building GitHub client")?;

        Ok(Self {
            drive,
            github,
            profile: Arc::new(cfg.contact.clone()),
        })
    }
}

/// Full application router with CORS for the static frontend.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    routes::routes::routes().with_state(state).layer(cors)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
