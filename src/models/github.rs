//! Subset of the GitHub REST payloads the portfolio renders.
//!
//! Unknown fields are ignored on deserialization, so only what the frontend
//! shows is modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bytes of code per language, as returned by `/repos/{owner}/{repo}/languages`.
pub type LanguageStats = BTreeMap<String, u64>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GithubUser {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: u32,
    pub public_gists: u32,
    pub followers: u32,
    pub following: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RepositoryOwner {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub private: bool,
    pub owner: RepositoryOwner,
    pub html_url: String,
    pub description: Option<String>,
    pub fork: bool,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub forks_count: u32,
    pub stargazers_count: u32,
    pub watchers_count: u32,
    pub open_issues_count: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    pub pushed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    /// True when the repository mentions `topic` in its topics, language or description.
    pub fn matches_topic(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        self.topics.iter().any(|t| *t == topic)
            || self
                .language
                .as_deref()
                .is_some_and(|lang| lang.to_lowercase() == topic)
            || self
                .description
                .as_deref()
                .is_some_and(|desc| desc.to_lowercase().contains(&topic))
    }

    /// Candidates for the "featured projects" section.
    pub fn is_featured(&self) -> bool {
        self.stargazers_count > 0
            || self.topics.iter().any(|t| t == "featured" || t == "portfolio")
            || self
                .description
                .as_deref()
                .is_some_and(|desc| desc.to_lowercase().contains("portfolio"))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommitDetail {
    pub author: CommitSignature,
    pub committer: CommitSignature,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
    pub html_url: String,
}

/// Aggregates computed from the public repository list.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_repos: usize,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Rough estimate; the REST API has no cheap total.
    pub total_commits: u64,
    pub languages: LanguageStats,
    pub recent_activity: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: String,
    pub count: u32,
}

/// Sort key accepted by `/users/{username}/repos`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySort {
    Created,
    #[default]
    Updated,
    Pushed,
    FullName,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    #[default]
    Owner,
    Public,
    Private,
}

/// Query options for listing repositories.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryQuery {
    pub sort: RepositorySort,
    pub direction: SortDirection,
    pub per_page: u32,
    #[serde(rename = "type")]
    pub kind: RepositoryType,
}

impl Default for RepositoryQuery {
    fn default() -> Self {
        Self {
            sort: RepositorySort::default(),
            direction: SortDirection::default(),
            per_page: 50,
            kind: RepositoryType::default(),
        }
    }
}

impl RepositoryQuery {
    /// Stable string used as the cache key for this query.
    pub fn cache_key(&self) -> String {
        format!(
            "repos_{:?}_{:?}_{}_{:?}",
            self.sort, self.direction, self.per_page, self.kind
        )
        .to_lowercase()
    }
}
