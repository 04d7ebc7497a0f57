//! GithubService - read-only client for the GitHub REST API, scoped to the
//! portfolio owner's public profile and repositories.

use crate::{
    models::github::{
        Commit, ContributionDay, GithubUser, LanguageStats, Repository, RepositoryQuery, UserStats,
    },
    services::cache::TtlCache,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::{
    Client, Response, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RATE_LIMIT_WARNING: u32 = 10;
const COMMITS_PER_REPO_ESTIMATE: u64 = 10;
const PINNED_LIMIT: usize = 6;
const USER_CACHE_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },
    #[error("GitHub resource not found: {0}")]
    NotFound(String),
    #[error("GitHub API returned HTTP {0}")]
    Status(StatusCode),
    #[error("README could not be decoded: {0}")]
    Decode(String),
    #[error("invalid GitHub token: {0}")]
    InvalidToken(#[from] header::InvalidHeaderValue),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at
        .map(|at| format!(", resets at {}", at.format("%H:%M:%S UTC")))
        .unwrap_or_default()
}

pub type GithubResult<T> = Result<T, GithubError>;

#[derive(Clone, Debug)]
pub struct GithubSettings {
    pub username: String,
    pub token: Option<String>,
    pub api_base: String,
    pub cache_ttl: Duration,
}

impl GithubSettings {
    pub const DEFAULT_API_BASE: &'static str = "https://api.github.com";
}

#[derive(Deserialize)]
struct ReadmePayload {
    content: String,
    #[serde(default)]
    encoding: String,
}

fn decode_readme(payload: &ReadmePayload) -> GithubResult<String> {
    if !payload.encoding.is_empty() && payload.encoding != "base64" {
        return Err(GithubError::Decode(format!(
            "unsupported encoding `{}`",
            payload.encoding
        )));
    }
    // GitHub wraps the base64 body at 60 columns.
    let compact: String = payload
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| GithubError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode(e.to_string()))
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Drop forks, private repositories and the profile README repository.
fn public_repositories(repos: Vec<Repository>, username: &str) -> Vec<Repository> {
    repos
        .into_iter()
        .filter(|repo| !repo.fork && !repo.private && !repo.name.eq_ignore_ascii_case(username))
        .collect()
}

fn aggregate_stats(repos: &[Repository], languages: Vec<LanguageStats>) -> UserStats {
    let mut merged = LanguageStats::new();
    for (language, bytes) in languages.into_iter().flatten() {
        *merged.entry(language).or_default() += bytes;
    }

    UserStats {
        total_repos: repos.len(),
        total_stars: repos.iter().map(|r| u64::from(r.stargazers_count)).sum(),
        total_forks: repos.iter().map(|r| u64::from(r.forks_count)).sum(),
        total_commits: repos.len() as u64 * COMMITS_PER_REPO_ESTIMATE,
        languages: merged,
        recent_activity: repos.iter().map(|r| r.updated_at).max(),
    }
}

/// Commit counts per UTC day, newest day first.
fn tally_activity<'a>(commits: impl IntoIterator<Item = &'a Commit>) -> Vec<ContributionDay> {
    let mut per_day: BTreeMap<String, u32> = BTreeMap::new();
    for commit in commits {
        let day = commit.commit.author.date.format("%Y-%m-%d").to_string();
        *per_day.entry(day).or_default() += 1;
    }

    per_day
        .into_iter()
        .rev()
        .map(|(date, count)| ContributionDay { date, count })
        .collect()
}

#[derive(Clone)]
pub struct GithubService {
    client: Client,
    settings: Arc<GithubSettings>,
    user: TtlCache<GithubUser>,
    repos: TtlCache<Vec<Repository>>,
}

impl GithubService {
    pub fn new(settings: GithubSettings) -> GithubResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("token {}", token))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            settings: Arc::new(settings),
            user: TtlCache::new(),
            repos: TtlCache::new(),
        })
    }

    pub fn username(&self) -> &str {
        &self.settings.username
    }

    pub fn clear_cache(&self) {
        self.user.clear();
        self.repos.clear();
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> GithubResult<T> {
        debug!("GitHub API request: GET {}", path);
        let response = self
            .client
            .get(format!("{}{}", self.settings.api_base, path))
            .query(query)
            .send()
            .await?;
        let response = Self::check(response, path)?;
        Ok(response.json().await?)
    }

    fn check(response: Response, path: &str) -> GithubResult<Response> {
        match response.status() {
            StatusCode::FORBIDDEN => Err(GithubError::RateLimited {
                reset_at: rate_limit_reset(response.headers()),
            }),
            StatusCode::NOT_FOUND => Err(GithubError::NotFound(path.to_string())),
            status if !status.is_success() => Err(GithubError::Status(status)),
            _ => {
                let remaining = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u32>().ok());
                if let Some(remaining) = remaining.filter(|r| *r < RATE_LIMIT_WARNING) {
                    warn!("GitHub API rate limit warning: {} requests remaining", remaining);
                }
                Ok(response)
            }
        }
    }

    pub async fn get_user(&self) -> GithubResult<GithubUser> {
        let path = format!("/users/{}", self.settings.username);
        self.user
            .get_or_cache(USER_CACHE_KEY, self.settings.cache_ttl, || {
                self.get_json(&path, &[])
            })
            .await
            .inspect_err(|e| error!("Error fetching GitHub user: {}", e))
    }

    /// Public, non-fork repositories of the configured user.
    pub async fn get_repositories(&self, query: &RepositoryQuery) -> GithubResult<Vec<Repository>> {
        let path = format!("/users/{}/repos", self.settings.username);
        let params = [
            ("sort", serde_value(&query.sort)),
            ("direction", serde_value(&query.direction)),
            ("per_page", query.per_page.to_string()),
            ("type", serde_value(&query.kind)),
        ];

        self.repos
            .get_or_cache(&query.cache_key(), self.settings.cache_ttl, || async {
                let repos: Vec<Repository> = self.get_json(&path, &params).await?;
                Ok::<_, GithubError>(public_repositories(repos, &self.settings.username))
            })
            .await
            .inspect_err(|e| error!("Error fetching repositories: {}", e))
    }

    /// Bytes per language. Failures yield an empty map.
    pub async fn get_repository_languages(&self, owner: &str, repo: &str) -> LanguageStats {
        let path = format!("/repos/{}/{}/languages", owner, repo);
        self.get_json(&path, &[]).await.unwrap_or_else(|e| {
            error!("Error fetching languages for {}: {}", repo, e);
            LanguageStats::new()
        })
    }

    /// Most recent commits. Failures yield an empty list.
    pub async fn get_repository_commits(&self, owner: &str, repo: &str, limit: u32) -> Vec<Commit> {
        let path = format!("/repos/{}/{}/commits", owner, repo);
        self.get_json(&path, &[("per_page", limit.to_string())])
            .await
            .unwrap_or_else(|e| {
                error!("Error fetching commits for {}: {}", repo, e);
                Vec::new()
            })
    }

    pub async fn get_repository_readme(&self, owner: &str, repo: &str) -> Option<String> {
        let path = format!("/repos/{}/{}/readme", owner, repo);
        let result = match self.get_json::<ReadmePayload>(&path, &[]).await {
            Ok(payload) => decode_readme(&payload),
            Err(e) => Err(e),
        };

        result
            .inspect_err(|e| error!("Error fetching README for {}: {}", repo, e))
            .ok()
    }

    pub async fn get_user_stats(&self) -> GithubResult<UserStats> {
        let repos = self.get_repositories(&RepositoryQuery::default()).await?;
        let languages = join_all(
            repos
                .iter()
                .map(|repo| self.get_repository_languages(&repo.owner.login, &repo.name)),
        )
        .await;

        Ok(aggregate_stats(&repos, languages))
    }

    /// Up to six featured repositories among the 20 most recently updated.
    pub async fn get_pinned_repositories(&self) -> GithubResult<Vec<Repository>> {
        let query = RepositoryQuery {
            per_page: 20,
            ..RepositoryQuery::default()
        };
        let repos = self.get_repositories(&query).await?;

        Ok(repos
            .into_iter()
            .filter(Repository::is_featured)
            .take(PINNED_LIMIT)
            .collect())
    }

    pub async fn search_repositories_by_topic(&self, topic: &str) -> Vec<Repository> {
        match self.get_repositories(&RepositoryQuery::default()).await {
            Ok(repos) => repos.into_iter().filter(|r| r.matches_topic(topic)).collect(),
            Err(e) => {
                error!("Error searching repositories by topic {:?}: {}", topic, e);
                Vec::new()
            }
        }
    }

    /// Approximate daily activity from the latest commits of the ten most
    /// recently updated repositories.
    pub async fn get_contribution_activity(&self) -> Vec<ContributionDay> {
        let query = RepositoryQuery {
            per_page: 10,
            ..RepositoryQuery::default()
        };
        let repos = match self.get_repositories(&query).await {
            Ok(repos) => repos,
            Err(e) => {
                error!("Error fetching contribution activity: {}", e);
                return Vec::new();
            }
        };

        let commits = join_all(
            repos
                .iter()
                .map(|repo| self.get_repository_commits(&repo.owner.login, &repo.name, 10)),
        )
        .await;

        tally_activity(commits.iter().flatten())
    }
}

/// Query-string form of a serde unit variant.
fn serde_value<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}
