use crate::common::{Fixture, Hits, TestApp, repo_json, routes};

fn portfolio_repos() -> Fixture {
    Fixture {
        repos: vec![
            repo_json("cypress-suite", false, false, 3, &["cypress", "qa"]),
            repo_json("notes", false, false, 0, &[]),
            repo_json("forked-lib", true, false, 50, &[]),
            repo_json("secret", false, true, 0, &[]),
            repo_json("flameuss", false, false, 1, &[]),
            repo_json("broken", false, false, 0, &["portfolio"]),
        ],
        ..Default::default()
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn rate_limited_upstream_maps_to_429() {
        let fixture = Fixture {
            github_status: 403,
            ..portfolio_repos()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(routes::GITHUB_USER).await;

        assert_eq!(res.status, 429, "{}", res.text);
        assert_eq!(res.body["status"], 429);
        assert!(res.body["error"].as_str().unwrap().contains("rate limit"));
    }

    #[tokio::test]
    async fn missing_upstream_resource_maps_to_404() {
        let fixture = Fixture {
            github_status: 404,
            ..portfolio_repos()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(routes::GITHUB_REPOS).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["status"], 404);
    }

    #[tokio::test]
    async fn search_degrades_to_empty_list() {
        let fixture = Fixture {
            github_status: 500,
            ..portfolio_repos()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(&routes::github_search("cypress")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }
}

mod repositories {
    use super::*;

    #[tokio::test]
    async fn forks_private_and_profile_repos_are_hidden() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(routes::GITHUB_REPOS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["cypress-suite", "notes", "broken"]);
    }

    #[tokio::test]
    async fn repository_list_is_cached_per_query() {
        let app = TestApp::spawn(portfolio_repos()).await;

        app.get(routes::GITHUB_REPOS).await;
        app.get(routes::GITHUB_REPOS).await;
        assert_eq!(Hits::get(&app.upstream.hits.github_repos), 1);

        app.get(&format!("{}?per_page=10", routes::GITHUB_REPOS)).await;
        assert_eq!(Hits::get(&app.upstream.hits.github_repos), 2);
    }

    #[tokio::test]
    async fn invalid_page_size_is_rejected() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(&format!("{}?per_page=0", routes::GITHUB_REPOS)).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn pinned_keeps_starred_or_tagged_repos() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(routes::GITHUB_PINNED).await;

        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["cypress-suite", "broken"]);
    }

    #[tokio::test]
    async fn topic_search_matches_topics_and_descriptions() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(&routes::github_search("cypress")).await;

        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(res.body[0]["name"], "cypress-suite");
    }
}

mod details {
    use super::*;

    #[tokio::test]
    async fn languages_degrade_to_empty_map() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let ok = app.get(&routes::repo_languages("flameuss", "notes")).await;
        assert_eq!(ok.body["Rust"], 1000);

        let broken = app.get(&routes::repo_languages("flameuss", "broken")).await;
        assert_eq!(broken.status, 200);
        assert_eq!(broken.body, serde_json::json!({}));
    }

    #[tokio::test]
    async fn readme_is_decoded_or_null() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(&routes::repo_readme("flameuss", "notes")).await;
        assert_eq!(res.body["content"], "# Portfolio\n");

        let missing = app.get(&routes::repo_readme("flameuss", "empty")).await;
        assert_eq!(missing.status, 200);
        assert!(missing.body["content"].is_null());
    }

    #[tokio::test]
    async fn stats_aggregate_visible_repositories() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(routes::GITHUB_STATS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalRepos"], 3);
        assert_eq!(res.body["totalStars"], 3);
        assert_eq!(res.body["totalForks"], 3);
        assert_eq!(res.body["totalCommits"], 30);
        // "broken" contributes nothing
        assert_eq!(res.body["languages"]["Rust"], 2000);
    }

    #[tokio::test]
    async fn activity_counts_commits_per_day() {
        let app = TestApp::spawn(portfolio_repos()).await;

        let res = app.get(routes::GITHUB_ACTIVITY).await;

        assert_eq!(
            res.body,
            serde_json::json!([
                { "date": "2024-05-02", "count": 3 },
                { "date": "2024-05-01", "count": 3 },
            ])
        );
    }
}
