use super::core::PostLookup;
use crate::{AppState, richtext};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::{DateTime, Utc};
use tracing::error;

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d %b %Y").to_string()
}

pub async fn posts_index_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let listing = app_state.posts.front_page().await;
    let config = app_state.posts.get_config();

    let posts: Vec<_> = listing
        .posts
        .iter()
        .map(|post| {
            liquid::object!({
                "slug": post.slug.clone(),
                "url": format!("{}/{}", config.url_prefix, post.slug),
                "title": post.title.clone(),
                "subtitle": post.subtitle.clone(),
                "author": post.author.clone(),
                "has_date": post.first_publication_date.is_some(),
                "date_formatted": post
                    .first_publication_date
                    .as_ref()
                    .map(format_date)
                    .unwrap_or_default(),
            })
        })
        .collect();

    let globals = liquid::object!({
        "site_name": app_state.config.app.name.clone(),
        "page_title": "Home",
        "posts": posts,
        "has_more": listing.can_load_more(),
        "next_page": listing.next_page.clone().unwrap_or_default(),
        "app_css_url": app_state
            .static_handler
            .get_versioned_url("/static/app.css")
            .await,
        "app_js_url": app_state
            .static_handler
            .get_versioned_url("/static/app.js")
            .await,
    });

    match app_state
        .template_engine
        .render_template(&config.index_template, globals)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

pub async fn post_detail_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let config = app_state.posts.get_config();

    let post = match app_state.posts.clone().get_post(&slug).await {
        PostLookup::Ready(post) => post,
        PostLookup::Pending => {
            let globals = liquid::object!({
                "site_name": app_state.config.app.name.clone(),
                "slug": slug,
            });
            return match app_state
                .template_engine
                .render_template(&config.loading_template, globals)
                .await
            {
                Ok(html) => Html(html).into_response(),
                Err(e) => {
                    error!("Template rendering error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
                }
            };
        }
        PostLookup::NotFound => {
            return (StatusCode::NOT_FOUND, "Post not found").into_response();
        }
    };

    let blocks: Vec<_> = post
        .content
        .iter()
        .map(|block| {
            liquid::object!({
                "heading": block.heading.clone(),
                "body_html": richtext::as_html(&block.body),
            })
        })
        .collect();

    let reading_minutes = post.reading_minutes as i64;
    let globals = liquid::object!({
        "site_name": app_state.config.app.name.clone(),
        "page_title": post.title.clone(),
        "post": {
            "slug": post.slug.clone(),
            "title": post.title.clone(),
            "author": post.author.clone(),
            "has_date": post.first_publication_date.is_some(),
            "date_formatted": post
                .first_publication_date
                .as_ref()
                .map(format_date)
                .unwrap_or_default(),
            "has_banner": post.banner_url.is_some(),
            "banner_url": post.banner_url.clone().unwrap_or_default(),
            "reading_minutes": reading_minutes,
        },
        "content": blocks,
        "app_css_url": app_state
            .static_handler
            .get_versioned_url("/static/app.css")
            .await,
    });

    match app_state
        .template_engine
        .render_template(&config.post_template, globals)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}
