use crate::richtext::RichTextFragment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as it appears in the listing. Fields map verbatim from the
/// document; a document without a publication date keeps `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextFragment>,
}

/// A full article for the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub slug: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub content: Vec<ContentBlock>,
    pub reading_minutes: u32,
}

/// One fetched page of summaries plus the cursor for the page after it.
#[derive(Debug, Clone, Serialize)]
pub struct PostsPage {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

/// The accumulated listing: everything loaded so far plus the current
/// cursor. The cursor is an opaque URL; absent or empty means the end.
#[derive(Debug, Clone, Default)]
pub struct PageCollection {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl PageCollection {
    pub fn can_load_more(&self) -> bool {
        self.next_page.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Folds a newly fetched page in: results go after the ones already
    /// collected (the cursor walks toward older posts, so appending keeps
    /// the listing newest-first) and the cursor is replaced wholesale.
    pub fn absorb(&mut self, page: PostsPage) {
        self.posts.extend(page.results);
        self.next_page = page.next_page;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsConfig {
    pub document_type: String,
    pub page_size: usize,
    pub url_prefix: String,
    pub index_template: String,
    pub post_template: String,
    pub loading_template: String,
    pub list_revalidate_seconds: u64,
    pub post_revalidate_seconds: u64,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            document_type: String::from("posts"),
            page_size: 3,
            url_prefix: String::from("/post"),
            index_template: String::from("pages/posts_index.html.liquid"),
            post_template: String::from("pages/post_detail.html.liquid"),
            loading_template: String::from("pages/post_loading.html.liquid"),
            list_revalidate_seconds: 180,
            post_revalidate_seconds: 3600,
        }
    }
}
