use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{Value, json};

use portfolio_api::AppState;
use portfolio_api::config::AppConfig;
use portfolio_api::models::profile::ContactProfile;
use portfolio_api::services::drive_service::DriveEndpoints;
use portfolio_api::services::matcher::MatcherConfig;

pub const GOOGLE_SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

pub mod routes {
    pub const CERTIFICATES: &str = "/api/certificates";
    pub const CERTIFICATES_SHEET: &str = "/api/certificates/sheet";
    pub const CERTIFICATES_FILES: &str = "/api/certificates/files";
    pub const CERTIFICATES_STATUS: &str = "/api/certificates/status";
    pub const CACHE_CLEAR: &str = "/api/certificates/cache/clear";
    pub const GITHUB_USER: &str = "/api/github/user";
    pub const GITHUB_REPOS: &str = "/api/github/repos";
    pub const GITHUB_PINNED: &str = "/api/github/repos/pinned";
    pub const GITHUB_STATS: &str = "/api/github/stats";
    pub const GITHUB_ACTIVITY: &str = "/api/github/activity";
    pub const PROFILE: &str = "/api/profile";
    pub const READYZ: &str = "/readyz";

    pub fn cache_resource(resource: &str) -> String {
        format!("/api/certificates/cache/{resource}")
    }

    pub fn github_search(topic: &str) -> String {
        format!("/api/github/repos/search?topic={topic}")
    }

    pub fn repo_languages(owner: &str, repo: &str) -> String {
        format!("/api/github/repos/{owner}/{repo}/languages")
    }

    pub fn repo_readme(owner: &str, repo: &str) -> String {
        format!("/api/github/repos/{owner}/{repo}/readme")
    }
}

/// How the stub Sheets API answers `values.get`.
#[derive(Clone)]
pub enum SheetReply {
    Values(Vec<Vec<&'static str>>),
    Status(u16),
}

/// Canned upstream payloads served by [`Upstream`].
#[derive(Clone)]
pub struct Fixture {
    pub files: Vec<Value>,
    pub sheet: SheetReply,
    pub csv: String,
    pub github_status: u16,
    pub repos: Vec<Value>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            sheet: SheetReply::Status(500),
            csv: String::new(),
            github_status: 200,
            repos: Vec::new(),
        }
    }
}

/// Request counters per upstream endpoint.
#[derive(Default)]
pub struct Hits {
    pub files_list: AtomicUsize,
    pub sheet_values: AtomicUsize,
    pub csv_export: AtomicUsize,
    pub github_repos: AtomicUsize,
}

impl Hits {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct UpstreamState {
    fixture: Fixture,
    hits: Arc<Hits>,
}

type Shared = State<Arc<UpstreamState>>;

/// Stub Google Drive / Sheets / GitHub server on a random local port.
pub struct Upstream {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
}

impl Upstream {
    pub async fn spawn(fixture: Fixture) -> Self {
        let hits = Arc::new(Hits::default());
        let state = Arc::new(UpstreamState {
            fixture,
            hits: hits.clone(),
        });

        let app = Router::new()
            .route("/drive/v3/files", get(list_files))
            .route(
                "/sheets/v4/spreadsheets/{id}/values/{range}",
                get(sheet_values),
            )
            .route("/docs/spreadsheets/d/{id}/export", get(csv_export))
            .route("/github/users/{user}", get(github_user))
            .route("/github/users/{user}/repos", get(github_repos))
            .route(
                "/github/repos/{owner}/{repo}/languages",
                get(github_languages),
            )
            .route("/github/repos/{owner}/{repo}/commits", get(github_commits))
            .route("/github/repos/{owner}/{repo}/readme", get(github_readme))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub upstream");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn drive_endpoints(&self) -> DriveEndpoints {
        DriveEndpoints {
            drive_api: format!("http://{}/drive/v3", self.addr),
            sheets_api: format!("http://{}/sheets/v4/spreadsheets", self.addr),
            sheets_export: format!("http://{}/docs/spreadsheets/d", self.addr),
            drive_web: "https://drive.google.com".into(),
        }
    }

    pub fn github_base(&self) -> String {
        format!("http://{}/github", self.addr)
    }
}

async fn list_files(State(state): Shared) -> Json<Value> {
    state.hits.files_list.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "files": state.fixture.files }))
}

async fn sheet_values(State(state): Shared) -> Response {
    state.hits.sheet_values.fetch_add(1, Ordering::SeqCst);
    match &state.fixture.sheet {
        SheetReply::Values(rows) => Json(json!({ "range": "A1:Z1000", "values": rows })).into_response(),
        SheetReply::Status(code) => {
            let status = StatusCode::from_u16(*code).unwrap();
            (status, Json(json!({ "error": { "code": code } }))).into_response()
        }
    }
}

async fn csv_export(State(state): Shared) -> Response {
    state.hits.csv_export.fetch_add(1, Ordering::SeqCst);
    if state.fixture.csv.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    state.fixture.csv.clone().into_response()
}

fn github_failure(state: &UpstreamState) -> Option<Response> {
    match state.fixture.github_status {
        200 => None,
        code => {
            let mut headers = HeaderMap::new();
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
            let status = StatusCode::from_u16(code).unwrap();
            Some((status, headers, Json(json!({ "message": "nope" }))).into_response())
        }
    }
}

async fn github_user(State(state): Shared, Path(user): Path<String>) -> Response {
    if let Some(failure) = github_failure(&state) {
        return failure;
    }
    Json(json!({
        "login": user,
        "id": 42,
        "avatar_url": "https://avatars.example/42",
        "html_url": format!("https://github.com/{user}"),
        "name": "Flame",
        "bio": "QA engineer",
        "public_repos": 4,
        "public_gists": 0,
        "followers": 10,
        "following": 3,
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2024-06-01T00:00:00Z"
    }))
    .into_response()
}

async fn github_repos(State(state): Shared) -> Response {
    state.hits.github_repos.fetch_add(1, Ordering::SeqCst);
    if let Some(failure) = github_failure(&state) {
        return failure;
    }
    Json(Value::Array(state.fixture.repos.clone())).into_response()
}

async fn github_languages(Path((_, repo)): Path<(String, String)>) -> Response {
    if repo == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "Rust": 1000, "Shell": 20 })).into_response()
}

async fn github_commits(Path((_, repo)): Path<(String, String)>) -> Json<Value> {
    let signature = |date: &str| json!({ "name": "flame", "email": "f@example.com", "date": date });
    let commit = |sha: &str, date: &str| {
        json!({
            "sha": sha,
            "commit": { "author": signature(date), "committer": signature(date), "message": repo },
            "html_url": "https://github.com/commit"
        })
    };
    Json(json!([
        commit("a1", "2024-05-02T10:00:00Z"),
        commit("a2", "2024-05-01T08:00:00Z"),
    ]))
}

async fn github_readme(Path((_, repo)): Path<(String, String)>) -> Response {
    if repo == "empty" {
        return StatusCode::NOT_FOUND.into_response();
    }
    // "# Portfolio\n"
    Json(json!({ "content": "IyBQb3J0Zm9s\naW8K\n", "encoding": "base64" })).into_response()
}

/// A repository payload in the GitHub REST shape.
pub fn repo_json(name: &str, fork: bool, private: bool, stars: u32, topics: &[&str]) -> Value {
    json!({
        "id": name.len(),
        "name": name,
        "full_name": format!("flameuss/{name}"),
        "private": private,
        "owner": { "login": "flameuss", "id": 42, "avatar_url": "a", "html_url": "h" },
        "html_url": format!("https://github.com/flameuss/{name}"),
        "description": format!("{name} project"),
        "fork": fork,
        "homepage": null,
        "language": "Rust",
        "forks_count": 1,
        "stargazers_count": stars,
        "watchers_count": stars,
        "open_issues_count": 0,
        "topics": topics,
        "pushed_at": "2024-05-01T00:00:00Z",
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2024-05-02T00:00:00Z"
    })
}

pub fn drive_file(id: &str, name: &str, mime: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": mime,
        "modifiedTime": "2024-06-01T12:00:00.000Z"
    })
}

/// Options for [`TestApp::spawn_with`].
pub struct AppOptions {
    pub cache_ttl: Duration,
    pub drive_configured: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(120),
            drive_configured: true,
        }
    }
}

/// A running API server wired to a stub upstream.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upstream: Upstream,
    pub state: AppState,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn(fixture: Fixture) -> Self {
        Self::spawn_with(fixture, AppOptions::default()).await
    }

    pub async fn spawn_with(fixture: Fixture, options: AppOptions) -> Self {
        let upstream = Upstream::spawn(fixture).await;

        let configured = |value: &str| options.drive_configured.then(|| value.to_string());
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            drive_api_key: configured("test-key"),
            drive_folder_id: configured("test-folder"),
            github_username: "flameuss".into(),
            github_token: None,
            cache_ttl: options.cache_ttl,
            column_mapping: None,
            matcher: MatcherConfig::default(),
            contact: ContactProfile {
                email: Some("flame@example.com".into()),
                github_url: Some("https://github.com/flameuss".into()),
                linkedin_url: None,
                whatsapp_number: Some("+55 (12) 99999-0000".into()),
                cv_download_url: None,
            },
        };

        let state = AppState::with_endpoints(&cfg, upstream.drive_endpoints(), &upstream.github_base())
            .expect("Failed to build app state");
        let app = portfolio_api::build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            upstream,
            state,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }
}
