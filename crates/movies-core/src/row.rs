use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' is not a valid {expected}")]
    InvalidValue {
        column: String,
        expected: &'static str,
    },
    #[error("column '{column}' holds malformed JSON: {source}")]
    Json {
        column: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One result row, as returned by a query gateway: named columns in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&Value, MapError> {
        self.get(column)
            .ok_or_else(|| MapError::MissingColumn(column.to_owned()))
    }

    pub fn str(&self, column: &str) -> Result<&str, MapError> {
        self.require(column)?
            .as_str()
            .ok_or_else(|| invalid(column, "string"))
    }

    pub fn opt_str(&self, column: &str) -> Result<Option<&str>, MapError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value.as_str())),
            _ => Err(invalid(column, "string")),
        }
    }

    pub fn i64(&self, column: &str) -> Result<i64, MapError> {
        self.require(column)?
            .as_i64()
            .ok_or_else(|| invalid(column, "integer"))
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>, MapError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            value => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(column, "integer")),
        }
    }

    /// Decodes an aggregated column. Engines hand JSON aggregates back as text,
    /// so string values are parsed; structured values are returned as-is.
    pub fn json(&self, column: &str) -> Result<Value, MapError> {
        match self.require(column)? {
            Value::String(raw) => serde_json::from_str(raw).map_err(|source| MapError::Json {
                column: column.to_owned(),
                source,
            }),
            value => Ok(value.clone()),
        }
    }
}

pub(crate) fn invalid(column: &str, expected: &'static str) -> MapError {
    MapError::InvalidValue {
        column: column.to_owned(),
        expected,
    }
}
