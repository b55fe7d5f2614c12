use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("API descriptor has no master ref")]
    MissingMasterRef,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
