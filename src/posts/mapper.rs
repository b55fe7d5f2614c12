//! Maps raw API documents onto the view models the pages render. Missing
//! optional fields become empty values rather than errors: the listing
//! query projects away detail fields and detail documents have no
//! subtitle, so both shapes pass through the same document type.

use super::{
    reading_time,
    types::{ContentBlock, PostDetail, PostSummary},
};
use crate::cms::types::Document;

pub fn summary_from_document(doc: &Document) -> PostSummary {
    PostSummary {
        slug: doc.uid.clone().unwrap_or_else(|| doc.id.clone()),
        first_publication_date: doc.first_publication_date,
        title: doc.data.title.clone().unwrap_or_default(),
        subtitle: doc.data.subtitle.clone().unwrap_or_default(),
        author: doc.data.author.clone().unwrap_or_default(),
    }
}

pub fn detail_from_document(doc: &Document) -> PostDetail {
    let content: Vec<ContentBlock> = doc
        .data
        .content
        .iter()
        .map(|block| ContentBlock {
            heading: block.heading.clone(),
            body: block.body.clone(),
        })
        .collect();

    let reading_minutes = reading_time::estimate(&content);

    PostDetail {
        slug: doc.uid.clone().unwrap_or_else(|| doc.id.clone()),
        first_publication_date: doc.first_publication_date,
        title: doc.data.title.clone().unwrap_or_default(),
        banner_url: doc.data.banner.as_ref().and_then(|b| b.url.clone()),
        author: doc.data.author.clone().unwrap_or_default(),
        content,
        reading_minutes,
    }
}
