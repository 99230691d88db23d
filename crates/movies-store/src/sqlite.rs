use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use movies_core::Row;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use serde_json::Value;

use crate::{
    DatabaseSelectionProvider, QueryGateway, QueryParams, StaticDatabaseSelection, StoreError,
    WriteSummary,
};

pub const DEFAULT_DATABASE_NAME: &str = "movies";

const DATABASE_EXTENSION: &str = "sqlite";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Property graph kept in SQLite: `movies` and `people` node tables joined by
/// a typed `relationships` edge table, plus a full-text index over movies.
///
/// The store holds no connection. Each gateway call opens a session on the
/// currently selected database file and drops it before returning.
pub struct SqliteGraphStore {
    data_dir: PathBuf,
    selection: Arc<dyn DatabaseSelectionProvider>,
}

impl SqliteGraphStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_selection(data_dir, StaticDatabaseSelection::default())
    }

    /// Opens the store and creates the database the provider currently selects.
    pub fn open_with_selection(
        data_dir: impl AsRef<Path>,
        selection: impl DatabaseSelectionProvider + 'static,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let store = Self {
            data_dir,
            selection: Arc::new(selection),
        };
        let database = store.selection.database_selection();
        store.create_database(database.as_deref())?;

        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self, database: Option<&str>) -> Result<PathBuf, StoreError> {
        let name = match database {
            Some(name) => validate_database_name(name)?,
            None => DEFAULT_DATABASE_NAME,
        };
        Ok(self.data_dir.join(format!("{name}.{DATABASE_EXTENSION}")))
    }

    /// Creates the database file if needed and brings its schema up to date.
    pub fn create_database(&self, database: Option<&str>) -> Result<PathBuf, StoreError> {
        let path = self.database_path(database)?;

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        run_migrations(&conn)?;

        Ok(path)
    }

    pub(crate) fn session(&self) -> Result<Connection, StoreError> {
        let database = self.selection.database_selection();
        let path = self.database_path(database.as_deref())?;
        if !path.exists() {
            return Err(StoreError::UnknownDatabase(
                database.unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_owned()),
            ));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

impl QueryGateway for SqliteGraphStore {
    fn run_query(&self, query: &str, params: &QueryParams<'_>) -> Result<Vec<Row>, StoreError> {
        let mut conn = self.session()?;
        let tx = conn.transaction()?;
        let rows = collect_rows(&tx, query, params)?;
        tx.commit()?;

        tracing::debug!(rows = rows.len(), "read query completed");
        Ok(rows)
    }

    fn run_write(
        &self,
        query: &str,
        params: &QueryParams<'_>,
    ) -> Result<WriteSummary, StoreError> {
        let mut conn = self.session()?;
        // Take the write lock up front so concurrent writers queue on the busy
        // timeout instead of failing a lock upgrade.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows_affected = tx.execute(query, params)?;
        tx.commit()?;

        tracing::debug!(rows_affected, "write query committed");
        Ok(WriteSummary { rows_affected })
    }
}

fn collect_rows(
    conn: &Connection,
    query: &str,
    params: &QueryParams<'_>,
) -> Result<Vec<Row>, StoreError> {
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut rows = stmt.query(params)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (index, column) in columns.iter().enumerate() {
            let value = column_value(column, row.get_ref(index)?)?;
            record.push(column.clone(), value);
        }
        records.push(record);
    }

    Ok(records)
}

fn column_value(column: &str, value: ValueRef<'_>) -> Result<Value, StoreError> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(value) => Ok(Value::from(value)),
        ValueRef::Real(value) => serde_json::Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| StoreError::UnsupportedValue(column.to_owned())),
        ValueRef::Text(bytes) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(StoreError::UnsupportedValue(column.to_owned())),
    }
}

fn validate_database_name(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidDatabaseName(name.to_owned()))
    }
}

pub(crate) fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            tagline TEXT,
            released INTEGER,
            votes INTEGER CHECK (votes IS NULL OR votes >= 0)
        );

        CREATE TABLE IF NOT EXISTS people (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            born INTEGER
        );

        CREATE TABLE IF NOT EXISTS relationships (
            person_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
            movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            roles TEXT,
            PRIMARY KEY (person_id, movie_id, type)
        );

        CREATE INDEX IF NOT EXISTS idx_relationships_movie
            ON relationships(movie_id, type);

        CREATE VIRTUAL TABLE IF NOT EXISTS movie_search USING fts5(
            title,
            tagline,
            content = 'movies',
            content_rowid = 'id'
        );

        CREATE TRIGGER IF NOT EXISTS movies_search_insert AFTER INSERT ON movies BEGIN
            INSERT INTO movie_search (rowid, title, tagline)
            VALUES (new.id, new.title, new.tagline);
        END;

        CREATE TRIGGER IF NOT EXISTS movies_search_delete AFTER DELETE ON movies BEGIN
            INSERT INTO movie_search (movie_search, rowid, title, tagline)
            VALUES ('delete', old.id, old.title, old.tagline);
        END;

        CREATE TRIGGER IF NOT EXISTS movies_search_update AFTER UPDATE OF title, tagline ON movies BEGIN
            INSERT INTO movie_search (movie_search, rowid, title, tagline)
            VALUES ('delete', old.id, old.title, old.tagline);
            INSERT INTO movie_search (rowid, title, tagline)
            VALUES (new.id, new.title, new.tagline);
        END;
        "#,
    )?;

    Ok(())
}
