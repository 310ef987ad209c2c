//! The graph store seam: parameterized statements in, typed rows out.
//!
//! Every statement the crate runs is a catalogued [`CypherQuery`] with its
//! parameters bound separately, so user input never ends up inside the query
//! text. Implementations decode whatever their backend returns into [`Row`]s
//! keyed by the fields the query declares.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cypher::{CypherQuery, QueryId};

/// Errors raised by a [`GraphStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error in {statement:?}: {source}")]
    Query {
        statement: QueryId,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Statement {statement:?} exceeded its {timeout_ms}ms deadline")]
    Timeout { statement: QueryId, timeout_ms: u64 },

    #[error("Failed to decode field {field}: {reason}")]
    Decode { field: &'static str, reason: String },

    #[error("Missing parameter ${param} for {statement:?}")]
    MissingParam {
        statement: QueryId,
        param: &'static str,
    },

    #[error("Injected failure for {statement:?}")]
    Injected { statement: QueryId },
}

// ── Values & rows ────────────────────────────────────────────────

/// A node projection: store-assigned id plus the requested properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: i64,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl NodeRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// String property, or a decode error if it is missing or not a string.
    pub fn str_property(&self, key: &'static str) -> Result<String, StoreError> {
        self.properties
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode {
                field: key,
                reason: format!("node {} has no string property", self.id),
            })
    }
}

/// A single value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Str(String),
    Node(NodeRecord),
}

/// One result row, keyed by the field names its query declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: BTreeMap<&'static str, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, value: Value) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &'static str, value: Value) {
        self.fields.insert(field, value);
    }

    /// Raw access; absent fields read as [`Value::Null`].
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    pub fn int(&self, field: &'static str) -> Result<i64, StoreError> {
        match self.get(field) {
            Value::Int(v) => Ok(*v),
            other => Err(unexpected(field, "integer", other)),
        }
    }

    pub fn opt_int(&self, field: &'static str) -> Result<Option<i64>, StoreError> {
        match self.get(field) {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v)),
            other => Err(unexpected(field, "integer", other)),
        }
    }

    pub fn string(&self, field: &'static str) -> Result<String, StoreError> {
        match self.get(field) {
            Value::Str(s) => Ok(s.clone()),
            other => Err(unexpected(field, "string", other)),
        }
    }

    pub fn opt_string(&self, field: &'static str) -> Result<Option<String>, StoreError> {
        match self.get(field) {
            Value::Null => Ok(None),
            Value::Str(s) => Ok(Some(s.clone())),
            other => Err(unexpected(field, "string", other)),
        }
    }

    pub fn node(&self, field: &'static str) -> Result<&NodeRecord, StoreError> {
        match self.get(field) {
            Value::Node(n) => Ok(n),
            other => Err(unexpected(field, "node", other)),
        }
    }
}

fn unexpected(field: &'static str, expected: &str, found: &Value) -> StoreError {
    StoreError::Decode {
        field,
        reason: format!("expected {expected}, found {found:?}"),
    }
}

// ── Statements ───────────────────────────────────────────────────

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Str(String),
    Int(i64),
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// A catalogued query with its parameters bound, ready to run.
#[derive(Debug, Clone)]
pub struct Statement {
    query: &'static CypherQuery,
    params: Vec<(&'static str, Param)>,
    deadline: Option<Duration>,
}

impl Statement {
    pub fn new(query: &'static CypherQuery) -> Self {
        Self {
            query,
            params: Vec::new(),
            deadline: None,
        }
    }

    /// Bind `$key` to `value`.
    pub fn param(mut self, key: &'static str, value: impl Into<Param>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// Override the store's default deadline for this statement.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn query(&self) -> &'static CypherQuery {
        self.query
    }

    pub fn id(&self) -> QueryId {
        self.query.id
    }

    pub fn params(&self) -> &[(&'static str, Param)] {
        &self.params
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.deadline
    }

    fn lookup(&self, key: &'static str) -> Result<&Param, StoreError> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .ok_or(StoreError::MissingParam {
                statement: self.query.id,
                param: key,
            })
    }

    pub fn str_param(&self, key: &'static str) -> Result<&str, StoreError> {
        match self.lookup(key)? {
            Param::Str(s) => Ok(s),
            Param::Int(_) => Err(StoreError::Decode {
                field: key,
                reason: "parameter is an integer, expected a string".to_string(),
            }),
        }
    }

    pub fn int_param(&self, key: &'static str) -> Result<i64, StoreError> {
        match self.lookup(key)? {
            Param::Int(v) => Ok(*v),
            Param::Str(_) => Err(StoreError::Decode {
                field: key,
                reason: "parameter is a string, expected an integer".to_string(),
            }),
        }
    }
}

// ── The seam ─────────────────────────────────────────────────────

/// Executes statements against a graph backend.
///
/// Each call acquires whatever backend resource it needs (a pooled
/// connection for Neo4j) and releases it before returning, on success,
/// failure, and deadline expiry alike. Nothing is held across calls.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, statement: Statement) -> Result<Vec<Row>, StoreError>;
}

#[async_trait]
impl<S: GraphStore + ?Sized> GraphStore for Arc<S> {
    async fn run(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        (**self).run(statement).await
    }
}

/// Run `work` under `deadline`. On expiry the future is dropped, releasing
/// whatever it held, and the statement fails with [`StoreError::Timeout`].
pub async fn with_deadline<T, F>(
    statement: QueryId,
    deadline: Duration,
    work: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?statement, ?deadline, "Statement timed out");
            Err(StoreError::Timeout {
                statement,
                timeout_ms: deadline.as_millis() as u64,
            })
        }
    }
}
