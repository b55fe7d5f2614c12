use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use kawaraban::{AppState, CmsConfig, Config, StaticConfig, TemplateConfig, create_app};

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn summary_doc(uid: &str, title: &str, subtitle: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": title,
            "subtitle": subtitle,
            "author": "Jane Doe"
        }
    })
}

fn detail_doc(uid: &str, title: &str) -> Value {
    // 1 heading word + 200 body words: reads in exactly 2 minutes
    let body = "word ".repeat(200);
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": title,
            "author": "Jane Doe",
            "banner": {"url": "https://images.example.com/banner.png"},
            "content": [
                {
                    "heading": "Intro",
                    "body": [{"type": "paragraph", "text": body.trim(), "spans": []}]
                }
            ]
        }
    })
}

async fn api_info_handler() -> Json<Value> {
    Json(json!({
        "refs": [
            {"id": "master", "ref": "stub-ref", "isMasterRef": true, "label": "Master"}
        ]
    }))
}

async fn search_handler(
    State(base): State<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();

    // uid lookup used by detail resolution
    if q.contains("my.posts.uid") {
        if q.contains("hidden-gem") {
            return Json(json!({
                "page": 1,
                "total_pages": 1,
                "next_page": null,
                "results": [detail_doc("hidden-gem", "Hidden Gem")]
            }));
        }
        return Json(json!({"page": 1, "total_pages": 1, "next_page": null, "results": []}));
    }

    // type query: two pages of three + two posts
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);

    if page == 1 {
        Json(json!({
            "page": 1,
            "results_per_page": 3,
            "total_results_size": 5,
            "total_pages": 2,
            "next_page": format!("{}/documents/search?ref=stub-ref&page=2", base),
            "prev_page": null,
            "results": [
                detail_doc("alpha-release", "Alpha Release"),
                detail_doc("beta-cycle", "Beta Cycle"),
                detail_doc("gamma-rays", "Gamma Rays")
            ]
        }))
    } else {
        Json(json!({
            "page": 2,
            "results_per_page": 3,
            "total_results_size": 5,
            "total_pages": 2,
            "next_page": null,
            "prev_page": format!("{}/documents/search?ref=stub-ref&page=1", base),
            "results": [
                summary_doc("delta-wave", "Delta Wave", "Waving goodbye"),
                summary_doc("epsilon-greedy", "Epsilon Greedy", "Almost always")
            ]
        }))
    }
}

/// Serves a Prismic-shaped API on an ephemeral local port and returns its
/// base URL.
async fn spawn_stub_cms() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let router = Router::new()
        .route("/", get(api_info_handler))
        .route("/documents/search", get(search_handler))
        .with_state(base.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    base
}

async fn setup() -> (AppState, TestServer) {
    let cms_base = spawn_stub_cms().await;

    let config = Config {
        templates: TemplateConfig {
            directory: repo_path("templates"),
        },
        static_files: StaticConfig {
            directory: repo_path("static"),
        },
        cms: CmsConfig {
            api_url: cms_base,
            access_token: None,
        },
        ..Config::default()
    };

    let state = AppState::new(config).unwrap();
    let server = TestServer::new(create_app(state.clone()).into_make_service()).unwrap();
    (state, server)
}

#[tokio::test]
async fn index_renders_first_page_with_load_more() {
    let (state, server) = setup().await;
    state.posts.refresh_listing().await.unwrap();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Alpha Release"));
    assert!(html.contains("Beta Cycle"));
    assert!(html.contains("Gamma Rays"));
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("15 Mar 2021"));

    // API order is preserved top to bottom
    let alpha = html.find("Alpha Release").unwrap();
    let beta = html.find("Beta Cycle").unwrap();
    let gamma = html.find("Gamma Rays").unwrap();
    assert!(alpha < beta && beta < gamma);

    // A cursor exists, so the load-more control is present and points at it
    assert!(html.contains("id=\"load-more\""));
    assert!(html.contains("page=2"));
}

#[tokio::test]
async fn index_before_first_refresh_is_empty_but_serves() {
    let (_state, server) = setup().await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!response.text().contains("id=\"load-more\""));
}

#[tokio::test]
async fn load_more_follows_cursor_and_reports_new_cursor() {
    let (state, server) = setup().await;
    state.posts.refresh_listing().await.unwrap();

    let cursor = state.posts.front_page().await.next_page.unwrap();

    let response = server
        .get("/api/posts/page")
        .add_query_param("cursor", &cursor)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = response.json();
    let results = page["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Delta Wave");
    assert_eq!(results[0]["slug"], "delta-wave");
    assert_eq!(results[0]["url"], "/post/delta-wave");
    assert_eq!(results[1]["title"], "Epsilon Greedy");
    // Second page is the last one
    assert!(page["next_page"].is_null());
}

#[tokio::test]
async fn load_more_rejects_foreign_cursor() {
    let (_state, server) = setup().await;

    let response = server
        .get("/api/posts/page")
        .add_query_param("cursor", "https://evil.example.com/api/v2/documents/search")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn load_more_upstream_failure_is_bad_gateway() {
    let (state, server) = setup().await;

    // Same origin, but a path the API does not serve
    let cursor = format!("{}/documents/nope", state.config.cms.api_url);
    let response = server
        .get("/api/posts/page")
        .add_query_param("cursor", &cursor)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn detail_renders_prebuilt_article() {
    let (state, server) = setup().await;
    let count = state.posts.prebuild_details().await.unwrap();
    assert_eq!(count, 5);
    assert_eq!(
        state.posts.known_slugs().await,
        [
            "alpha-release",
            "beta-cycle",
            "delta-wave",
            "epsilon-greedy",
            "gamma-rays"
        ]
    );

    let response = server.get("/post/gamma-rays").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Gamma Rays"));
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("2 min"));
    assert!(html.contains("https://images.example.com/banner.png"));
    assert!(html.contains("<h2>Intro</h2>"));
}

#[tokio::test]
async fn unknown_slug_gets_placeholder_then_article() {
    let (state, server) = setup().await;
    state.posts.prebuild_details().await.unwrap();

    // "hidden-gem" is not part of the catalog walk, only the uid lookup
    let response = server.get("/post/hidden-gem").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Loading"));

    let mut article = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let response = server.get("/post/hidden-gem").await;
        if response.status_code() == StatusCode::OK && response.text().contains("Hidden Gem") {
            article = Some(response.text());
            break;
        }
    }

    let html = article.expect("fallback generation never produced the article");
    assert!(html.contains("Hidden Gem"));
    assert!(html.contains("2 min"));
}

#[tokio::test]
async fn confirmed_missing_slug_becomes_404() {
    let (state, server) = setup().await;
    state.posts.prebuild_details().await.unwrap();

    // First hit: fallback generation kicks off, placeholder renders
    let response = server.get("/post/never-written").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Loading"));

    let mut not_found = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let response = server.get("/post/never-written").await;
        if response.status_code() == StatusCode::NOT_FOUND {
            not_found = true;
            break;
        }
    }
    assert!(not_found, "missing slug never resolved to 404");
}

#[tokio::test]
async fn static_assets_and_robots_serve() {
    let (_state, server) = setup().await;

    let response = server.get("/static/app.css").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.header("content-type").to_str().unwrap().starts_with("text/css"));

    let response = server.get("/robots.txt").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("User-agent"));
}
