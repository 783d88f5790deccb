use std::path::PathBuf;

use agency_api::AgencyApiError;
use thiserror::Error;
use token_store::TokenStoreError;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] AgencyApiError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error("failed to read document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
