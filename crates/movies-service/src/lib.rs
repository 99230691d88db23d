use movies_core::MapError;
use movies_store::StoreError;
use thiserror::Error;

mod search;
mod service;

pub use search::strip_wildcards;
pub use service::{MovieService, PageRequest};

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("query failed: {0}")]
    Query(#[from] StoreError),
}

impl From<MapError> for MovieError {
    fn from(err: MapError) -> Self {
        Self::Query(StoreError::Map(err))
    }
}

impl MovieError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Query(_) => "query",
        }
    }
}
