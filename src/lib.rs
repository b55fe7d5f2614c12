use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod cms;
pub mod posts;
pub mod richtext;
pub mod robots;
pub mod startup_checks;
pub mod static_files;
pub mod templating;

#[cfg(test)]
mod templating_tests;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    pub cms: CmsConfig,
    pub posts: posts::PostsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    pub base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Kawaraban".to_string(),
            log_level: "info".to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static"),
        }
    }
}

/// Where the content lives. Constructed explicitly and handed to the
/// client; nothing reads the repository URL or token from the process
/// environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CmsConfig {
    pub api_url: String,
    pub access_token: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8091/api/v2".to_string(),
            access_token: None,
        }
    }
}

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub posts: Arc<posts::PostsManager>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, cms::CmsError> {
        let client = Arc::new(cms::CmsClient::new(config.cms.clone())?);
        let posts = Arc::new(posts::PostsManager::new(config.posts.clone(), client));

        Ok(Self {
            template_engine: Arc::new(templating::TemplateEngine::new(
                config.templates.directory.clone(),
            )),
            static_handler: static_files::StaticFileHandler::new(
                config.static_files.directory.clone(),
            ),
            posts,
            config,
        })
    }
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let has_version = query.as_deref().is_some_and(|q| q.contains("v="));
    app_state.static_handler.serve(&path, has_version).await
}

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(posts::handlers::posts_index_handler))
        .route(
            "/post/{slug}",
            axum::routing::get(posts::handlers::post_detail_handler),
        )
        .route(
            "/api/posts/page",
            axum::routing::get(api::posts_page_handler),
        )
        .route(
            "/robots.txt",
            axum::routing::get(robots::robots_txt_handler),
        )
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
