//! Neo4j connection management and the Bolt-backed graph store.

use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};

use kinmap_core::config::Neo4jSettings;

use crate::cypher::{CypherQuery, FieldKind};
use crate::store::{
    with_deadline, GraphStore, NodeRecord, Param, Row, Statement, StoreError, Value,
};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub query_timeout: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
            query_timeout: Duration::from_millis(settings.query_timeout_ms),
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc). Connections are checked out of the pool per
/// statement and go back when the row stream is dropped.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    query_timeout: Duration,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, StoreError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            query_timeout: config.query_timeout,
        })
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Execute a statement and decode every row.
    async fn collect(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let query_err = |source| StoreError::Query {
            statement: statement.id(),
            source,
        };

        let mut stream = self
            .graph
            .execute(to_neo4j_query(statement))
            .await
            .map_err(query_err)?;

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(query_err)? {
            rows.push(decode_row(statement.query(), &row)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn run(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        let deadline = statement.timeout().unwrap_or(self.query_timeout);
        tracing::debug!(statement = ?statement.id(), ?deadline, "Running statement");

        with_deadline(statement.id(), deadline, self.collect(&statement)).await
    }
}

fn to_neo4j_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(neo4rs::query(statement.query().text), |q, (key, value)| {
            match value {
                Param::Str(s) => q.param(key, s.clone()),
                Param::Int(i) => q.param(key, *i),
            }
        })
}

fn decode_row(query: &CypherQuery, row: &neo4rs::Row) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for &(field, kind) in query.fields {
        let decode_err = |e: neo4rs::DeError| StoreError::Decode {
            field,
            reason: e.to_string(),
        };
        let value = match kind {
            FieldKind::Int => row
                .get::<Option<i64>>(field)
                .map_err(decode_err)?
                .map_or(Value::Null, Value::Int),
            FieldKind::Str => row
                .get::<Option<String>>(field)
                .map_err(decode_err)?
                .map_or(Value::Null, Value::Str),
            FieldKind::Node(props) => {
                let node: neo4rs::Node = row.get(field).map_err(decode_err)?;
                Value::Node(node_to_record(&node, props))
            }
        };
        out.insert(field, value);
    }
    Ok(out)
}

/// Convert a neo4rs::Node to our lightweight NodeRecord.
fn node_to_record(node: &neo4rs::Node, props: &[&str]) -> NodeRecord {
    let mut record = NodeRecord::new(node.id());
    for key in props {
        if let Ok(v) = node.get::<String>(key) {
            record = record.with_property(key, v);
        } else if let Ok(v) = node.get::<i64>(key) {
            record = record.with_property(key, v);
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_settings() {
        let settings = Neo4jSettings {
            uri: "bolt://db:7687".to_string(),
            query_timeout_ms: 1_500,
            ..Default::default()
        };
        let config = GraphConfig::from(&settings);
        assert_eq!(config.uri, "bolt://db:7687");
        assert_eq!(config.query_timeout, Duration::from_millis(1_500));
        assert_eq!(config.max_connections, 16);
    }
}
