use crate::richtext::RichTextFragment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Descriptor returned by the API root. Only the ref list matters here;
/// every query must carry the current master ref.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub ref_token: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
    #[serde(default)]
    pub label: Option<String>,
}

/// One document as the API returns it. `data` covers both the projected
/// listing shape (title/subtitle/author only) and the full detail shape,
/// so every field in it is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: DocumentData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub banner: Option<Banner>,
    #[serde(default)]
    pub content: Vec<RawBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: Vec<RichTextFragment>,
}

/// Result envelope shared by the search endpoint and opaque cursor URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
}

// The API emits offsets without a colon ("+0000"), which strict RFC 3339
// parsing rejects. A null or absent date stays None.
fn deserialize_publication_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_publication_date(&s)))
}

fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(date.with_timezone(&Utc));
    }

    None
}
