use crate::cms::CmsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostsError {
    #[error("content API error: {0}")]
    Cms(#[from] CmsError),
}
