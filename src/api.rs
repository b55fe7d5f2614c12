use crate::{AppState, posts::handlers::format_date};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, warn};

#[derive(Deserialize)]
pub struct PageQuery {
    cursor: String,
}

/// Load-more endpoint for the listing page: follows the opaque next-page
/// cursor and returns the mapped results plus the cursor after them. The
/// page script owns the accumulated list; a failure here leaves it
/// untouched.
pub async fn posts_page_handler(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    if !app_state.posts.cursor_allowed(&query.cursor) {
        warn!("Rejected cursor outside the configured API: {}", query.cursor);
        return (
            StatusCode::BAD_REQUEST,
            "Cursor does not point at the configured content API",
        )
            .into_response();
    }

    match app_state.posts.load_more(&query.cursor).await {
        Ok(page) => {
            let results: Vec<_> = page
                .results
                .iter()
                .map(|post| {
                    serde_json::json!({
                        "slug": post.slug,
                        "url": format!(
                            "{}/{}",
                            app_state.posts.get_config().url_prefix,
                            post.slug
                        ),
                        "title": post.title,
                        "subtitle": post.subtitle,
                        "author": post.author,
                        "first_publication_date": post.first_publication_date,
                        "date_formatted": post
                            .first_publication_date
                            .as_ref()
                            .map(format_date),
                    })
                })
                .collect();

            Json(serde_json::json!({
                "results": results,
                "next_page": page.next_page,
            }))
            .into_response()
        }
        Err(e) => {
            error!("Failed to load more posts: {}", e);
            (StatusCode::BAD_GATEWAY, "Failed to fetch the next page").into_response()
        }
    }
}
