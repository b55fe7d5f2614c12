use super::{
    error::PostsError,
    mapper,
    types::{PageCollection, PostDetail, PostsConfig, PostsPage},
};
use crate::cms::CmsClient;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Owns every cached page the server renders. The listing is refreshed on
/// a fixed interval by a background task; details carry a per-entry
/// fetched-at stamp and are refetched on access once stale. Requests only
/// ever read the cache, so a failed refresh leaves the last good data in
/// place.
pub struct PostsManager {
    config: PostsConfig,
    client: Arc<CmsClient>,
    listing: RwLock<PageCollection>,
    details: RwLock<HashMap<String, DetailEntry>>,
}

enum DetailEntry {
    /// A fetch for this slug is in flight; render the placeholder.
    Pending,
    /// The API confirmed there is no such document. Re-checked after the
    /// detail revalidation interval so late-published posts appear.
    Missing { checked_at: Instant },
    Ready {
        post: Arc<PostDetail>,
        fetched_at: Instant,
    },
}

pub enum PostLookup {
    Ready(Arc<PostDetail>),
    Pending,
    NotFound,
}

impl PostsManager {
    pub fn new(config: PostsConfig, client: Arc<CmsClient>) -> Self {
        Self {
            config,
            client,
            listing: RwLock::new(PageCollection::default()),
            details: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_config(&self) -> &PostsConfig {
        &self.config
    }

    pub fn client(&self) -> &CmsClient {
        &self.client
    }

    pub fn cursor_allowed(&self, cursor: &str) -> bool {
        self.client.is_same_origin(cursor)
    }

    fn listing_fetch_fields(&self) -> Vec<String> {
        ["title", "subtitle", "author"]
            .iter()
            .map(|field| format!("{}.{}", self.config.document_type, field))
            .collect()
    }

    fn detail_fetch_fields(&self) -> Vec<String> {
        ["title", "subtitle", "author", "banner", "content"]
            .iter()
            .map(|field| format!("{}.{}", self.config.document_type, field))
            .collect()
    }

    /// Fetches the first listing page and swaps it in. Called once at
    /// startup and then from the background refresh task; until the first
    /// success the listing renders empty.
    pub async fn refresh_listing(&self) -> Result<(), PostsError> {
        let response = self
            .client
            .query_type(
                &self.config.document_type,
                &self.listing_fetch_fields(),
                Some(self.config.page_size),
            )
            .await?;

        let posts = response
            .results
            .iter()
            .map(mapper::summary_from_document)
            .collect::<Vec<_>>();

        info!(
            "Listing refreshed: {} posts, more pages: {}",
            posts.len(),
            response.next_page.is_some()
        );

        let mut listing = self.listing.write().await;
        *listing = PageCollection {
            posts,
            next_page: response.next_page,
        };

        Ok(())
    }

    pub fn start_background_refresh(manager: Arc<PostsManager>) {
        let period = Duration::from_secs(manager.config.list_revalidate_seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // Skip the first immediate tick

            loop {
                interval.tick().await;
                debug!("Starting scheduled listing refresh");

                if let Err(e) = manager.refresh_listing().await {
                    error!("Failed to refresh listing: {}", e);
                }
            }
        });
    }

    /// The current accumulated listing: first page plus cursor.
    pub async fn front_page(&self) -> PageCollection {
        self.listing.read().await.clone()
    }

    /// Follows an opaque cursor and maps its results through the same
    /// summary shape as the initial load. Stateless: the caller owns the
    /// accumulated list.
    pub async fn load_more(&self, cursor: &str) -> Result<PostsPage, PostsError> {
        let response = self.client.fetch_page(cursor).await?;

        Ok(PostsPage {
            results: response
                .results
                .iter()
                .map(mapper::summary_from_document)
                .collect(),
            next_page: response.next_page,
        })
    }

    /// Walks the whole catalog with the full field projection and primes
    /// the detail cache, so every slug known at startup renders without a
    /// fallback round trip. Returns how many posts were cached.
    pub async fn prebuild_details(&self) -> Result<usize, PostsError> {
        let mut response = self
            .client
            .query_type(&self.config.document_type, &self.detail_fetch_fields(), None)
            .await?;

        let mut collected = 0;
        loop {
            {
                let mut details = self.details.write().await;
                for doc in &response.results {
                    let post = Arc::new(mapper::detail_from_document(doc));
                    debug!("Prebuilt post: {}", post.slug);
                    details.insert(
                        post.slug.clone(),
                        DetailEntry::Ready {
                            post,
                            fetched_at: Instant::now(),
                        },
                    );
                    collected += 1;
                }
            }

            match response.next_page {
                Some(cursor) if !cursor.is_empty() => {
                    response = self.client.fetch_page(&cursor).await?;
                }
                _ => break,
            }
        }

        info!("Prebuilt {} post pages", collected);
        Ok(collected)
    }

    /// Resolves one slug against the cache. A fresh entry is returned as
    /// is; a stale one is refetched inline, keeping the stale copy if the
    /// refetch fails; an unknown slug kicks off a background fetch and
    /// reports `Pending` so the caller renders the placeholder.
    pub async fn get_post(self: Arc<Self>, slug: &str) -> PostLookup {
        let ttl = Duration::from_secs(self.config.post_revalidate_seconds);

        enum Probe {
            Fresh(Arc<PostDetail>),
            // Ready-but-expired carries the old post; expired-missing None
            Stale(Option<Arc<PostDetail>>),
            Pending,
            Missing,
            Unknown,
        }

        let probe = {
            let details = self.details.read().await;
            match details.get(slug) {
                Some(DetailEntry::Ready { post, fetched_at }) => {
                    if fetched_at.elapsed() < ttl {
                        Probe::Fresh(post.clone())
                    } else {
                        Probe::Stale(Some(post.clone()))
                    }
                }
                Some(DetailEntry::Pending) => Probe::Pending,
                Some(DetailEntry::Missing { checked_at }) => {
                    if checked_at.elapsed() < ttl {
                        Probe::Missing
                    } else {
                        Probe::Stale(None)
                    }
                }
                None => Probe::Unknown,
            }
        };

        match probe {
            Probe::Fresh(post) => PostLookup::Ready(post),
            Probe::Pending => PostLookup::Pending,
            Probe::Missing => PostLookup::NotFound,
            Probe::Unknown => {
                Self::spawn_fallback_fetch(self.clone(), slug.to_string());
                PostLookup::Pending
            }
            Probe::Stale(stale_post) => match self.fetch_detail(slug).await {
                Ok(Some(post)) => PostLookup::Ready(post),
                Ok(None) => PostLookup::NotFound,
                Err(e) => {
                    warn!("Failed to revalidate post {}: {}", slug, e);
                    match stale_post {
                        Some(post) => PostLookup::Ready(post),
                        None => PostLookup::NotFound,
                    }
                }
            },
        }
    }

    /// Marks the slug pending and fetches it off the request path. The
    /// placeholder page polls until the entry resolves; on a fetch error
    /// the marker is removed so a later request retries.
    fn spawn_fallback_fetch(manager: Arc<Self>, slug: String) {
        tokio::spawn(async move {
            {
                let mut details = manager.details.write().await;
                let claimable = matches!(
                    details.get(&slug),
                    None | Some(DetailEntry::Missing { .. })
                );
                if !claimable {
                    // Another request already claimed this slug.
                    return;
                }
                details.insert(slug.clone(), DetailEntry::Pending);
            }

            info!("Generating page for new slug: {}", slug);

            if let Err(e) = manager.fetch_detail(&slug).await {
                error!("Fallback fetch for {} failed: {}", slug, e);
                let mut details = manager.details.write().await;
                if let Some(DetailEntry::Pending) = details.get(&slug) {
                    details.remove(&slug);
                }
            }
        });
    }

    /// Fetches one document by uid and records the outcome, positive or
    /// negative, in the cache.
    async fn fetch_detail(&self, slug: &str) -> Result<Option<Arc<PostDetail>>, PostsError> {
        let document = self
            .client
            .get_by_uid(&self.config.document_type, slug)
            .await?;

        let mut details = self.details.write().await;
        match document {
            Some(doc) => {
                let post = Arc::new(mapper::detail_from_document(&doc));
                details.insert(
                    slug.to_string(),
                    DetailEntry::Ready {
                        post: post.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(Some(post))
            }
            None => {
                details.insert(
                    slug.to_string(),
                    DetailEntry::Missing {
                        checked_at: Instant::now(),
                    },
                );
                Ok(None)
            }
        }
    }

    /// Slugs currently resolvable without fallback generation.
    pub async fn known_slugs(&self) -> Vec<String> {
        let details = self.details.read().await;
        let mut slugs: Vec<String> = details
            .iter()
            .filter_map(|(slug, entry)| match entry {
                DetailEntry::Ready { .. } => Some(slug.clone()),
                _ => None,
            })
            .collect();
        slugs.sort();
        slugs
    }
}
