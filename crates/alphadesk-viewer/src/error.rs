//! Viewer error types.

use alphadesk_api::ApiError;
use alphadesk_core::FeedItemKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Branch not found: {0}")]
    BranchNotFound(FeedItemKey),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
