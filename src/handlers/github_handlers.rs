//! GitHub endpoints. Thin wrappers over `GithubService`; upstream failures
//! surface through `AppError` (rate limit -> 429, missing -> 404).

use crate::{
    AppState,
    errors::AppError,
    models::github::{
        Commit, ContributionDay, GithubUser, LanguageStats, Repository, RepositoryQuery, UserStats,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

const DEFAULT_COMMIT_LIMIT: u32 = 5;
const MAX_COMMIT_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitsQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct ReadmeResponse {
    pub owner: String,
    pub repo: String,
    pub content: Option<String>,
}

pub async fn get_user(State(state): State<AppState>) -> Result<Json<GithubUser>, AppError> {
    Ok(Json(state.github.get_user().await?))
}

/// `GET /api/github/repos?sort=&direction=&per_page=&type=`
pub async fn list_repositories(
    State(state): State<AppState>,
    Query(query): Query<RepositoryQuery>,
) -> Result<Json<Vec<Repository>>, AppError> {
    if !(1..=100).contains(&query.per_page) {
        return Err(AppError::bad_request("per_page must be between 1 and 100"));
    }
    Ok(Json(state.github.get_repositories(&query).await?))
}

pub async fn pinned_repositories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Repository>>, AppError> {
    Ok(Json(state.github.get_pinned_repositories().await?))
}

pub async fn search_repositories(
    State(state): State<AppState>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<Vec<Repository>>, AppError> {
    let topic = query.topic.trim();
    if topic.is_empty() {
        return Err(AppError::bad_request("topic must not be empty"));
    }
    Ok(Json(state.github.search_repositories_by_topic(topic).await))
}

pub async fn repository_languages(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Json<LanguageStats> {
    Json(state.github.get_repository_languages(&owner, &repo).await)
}

pub async fn repository_commits(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CommitsQuery>,
) -> Json<Vec<Commit>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_COMMIT_LIMIT)
        .clamp(1, MAX_COMMIT_LIMIT);
    Json(state.github.get_repository_commits(&owner, &repo, limit).await)
}

pub async fn repository_readme(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Json<ReadmeResponse> {
    let content = state.github.get_repository_readme(&owner, &repo).await;
    Json(ReadmeResponse {
        owner,
        repo,
        content,
    })
}

pub async fn user_stats(State(state): State<AppState>) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.github.get_user_stats().await?))
}

pub async fn contribution_activity(State(state): State<AppState>) -> Json<Vec<ContributionDay>> {
    Json(state.github.get_contribution_activity().await)
}
