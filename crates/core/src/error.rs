use crate::models::{DocumentKind, EntityId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("document has no terms left after normalization")]
    EmptyDocument,

    #[error("corpus has no terms left after normalization")]
    EmptyCorpus,

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus parse error: {0}")]
    CorpusParse(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("invalid query vector: {0}")]
    InvalidQueryVector(String),

    #[error("candidate {id} has {found} dimensions, query has {expected}")]
    DimensionMismatch {
        id: EntityId,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("id {0} cannot be used as a path segment")]
    InvalidId(EntityId),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("{0}")]
    Validation(String),

    #[error("vector for user {user_id} not found: {reason}")]
    UserVectorNotFound { user_id: EntityId, reason: String },

    #[error("stored {kind} vector {id} is invalid: {reason}")]
    InvalidVectorData {
        kind: DocumentKind,
        id: EntityId,
        reason: String,
    },

    #[error(transparent)]
    Vectorize(#[from] VectorizeError),

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

pub type Result<T, E = RecommendError> = std::result::Result<T, E>;
