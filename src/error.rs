use thiserror::Error;

use crate::store::StoreError;

pub const NO_REVIEWS_DETAIL: &str = "No reviews found for this app";

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("app not found: {app_id}")]
    NotFound { app_id: String },

    #[error("{}", NO_REVIEWS_DETAIL)]
    NoReviews,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyzeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::NoReviews => "no_reviews",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AnalyzeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { app_id } => Self::NotFound { app_id },
            StoreError::Transport(_) | StoreError::Status { .. } => {
                Self::UpstreamUnavailable(err.to_string())
            }
            StoreError::Parse(message) => {
                Self::Internal(format!("unreadable store response: {message}"))
            }
        }
    }
}
