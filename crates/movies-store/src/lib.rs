use movies_core::{MapError, MovieKey, Row};
use thiserror::Error;

pub mod queries;
mod seed;
mod sqlite;

pub use rusqlite::named_params;
pub use rusqlite::types::ToSql;
pub use seed::{SeedDataset, SeedMovie, SeedPerson, SeedRelationship, SeedSummary};
pub use sqlite::{DEFAULT_DATABASE_NAME, SqliteGraphStore};

/// Named parameters bound to one query; build them with [`named_params!`].
pub type QueryParams<'a> = [(&'a str, &'a dyn ToSql)];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row mapping error: {0}")]
    Map(#[from] MapError),
    #[error("database '{0}' does not exist")]
    UnknownDatabase(String),
    #[error("invalid database name '{0}', expected ASCII letters, digits, '-' or '_'")]
    InvalidDatabaseName(String),
    #[error("unsupported column value in '{0}'")]
    UnsupportedValue(String),
    #[error("invalid seed data: {0}")]
    InvalidSeed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    pub rows_affected: usize,
}

/// Executes parameterized queries against the graph engine.
///
/// Every call runs on its own session which is released before the call
/// returns. Failures are surfaced unchanged; nothing is retried.
pub trait QueryGateway: Send + Sync {
    fn run_query(&self, query: &str, params: &QueryParams<'_>) -> Result<Vec<Row>, StoreError>;

    /// Runs one mutating statement inside a write transaction.
    fn run_write(&self, query: &str, params: &QueryParams<'_>)
    -> Result<WriteSummary, StoreError>;
}

/// Resolves which database serves the current call. `None` means the default.
pub trait DatabaseSelectionProvider: Send + Sync {
    fn database_selection(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticDatabaseSelection(Option<String>);

impl StaticDatabaseSelection {
    pub fn new(database: Option<String>) -> Self {
        Self(database)
    }
}

impl DatabaseSelectionProvider for StaticDatabaseSelection {
    fn database_selection(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Bind value for a [`MovieKey`], used with the `:key` parameter.
pub fn key_param(key: &MovieKey) -> &dyn ToSql {
    match key {
        MovieKey::Id(id) => id,
        MovieKey::Title(title) => title,
    }
}
