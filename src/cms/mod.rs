pub mod client;
pub mod error;
pub mod types;

pub use client::CmsClient;
pub use error::CmsError;
pub use types::{ApiInfo, ApiRef, Document, DocumentData, QueryResponse};
