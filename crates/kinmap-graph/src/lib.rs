//! kinmap Graph: people, places, and how they connect.
//!
//! This crate is the single mutation point for the people graph. All reads
//! and writes flow through [`PeopleGraph`], which runs catalogued Cypher
//! statements against a [`GraphStore`]: Neo4j in production, or the
//! in-process [`MemoryStore`].

pub mod client;
pub mod cypher;
pub mod entities;
pub mod error;
pub mod listing;
pub mod memory;
pub mod relationships;
pub mod store;
pub mod view;

use kinmap_core::config::GraphSettings;
use kinmap_core::EntityPolicy;

pub use client::{GraphClient, GraphConfig};
pub use error::GraphError;
pub use memory::MemoryStore;
pub use store::{GraphStore, Row, Statement, StoreError, Value};

use crate::error::Result;

/// The people graph: entity repository, relationship service, view
/// assembler, and listings over a single store.
///
/// Clone is cheap when the store is (`GraphClient`, `Arc<_>`).
#[derive(Debug, Clone)]
pub struct PeopleGraph<S = GraphClient> {
    store: S,
    policy: EntityPolicy,
    max_person_limit: u32,
}

impl<S: GraphStore> PeopleGraph<S> {
    pub fn new(store: S) -> Self {
        let defaults = GraphSettings::default();
        Self {
            store,
            policy: defaults.entity_policy,
            max_person_limit: defaults.max_person_limit,
        }
    }

    pub fn from_settings(store: S, settings: &GraphSettings) -> Self {
        Self::new(store)
            .with_policy(settings.entity_policy)
            .with_max_person_limit(settings.max_person_limit)
    }

    pub fn with_policy(mut self, policy: EntityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_person_limit(mut self, limit: u32) -> Self {
        self.max_person_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> EntityPolicy {
        self.policy
    }

    /// Create the lookup indexes, or uniqueness constraints when names are
    /// unique keys. Idempotent.
    ///
    /// Switching policy on an existing database requires dropping the
    /// previous policy's index or constraint first.
    pub async fn ensure_schema(&self) -> Result<()> {
        let queries = match self.policy {
            EntityPolicy::MergeOnName => {
                [&cypher::PERSON_NAME_UNIQUE, &cypher::LOCATION_KEY_UNIQUE]
            }
            EntityPolicy::AlwaysInsert => {
                [&cypher::PERSON_NAME_INDEX, &cypher::LOCATION_KEY_INDEX]
            }
        };
        for query in queries {
            self.store.run(Statement::new(query)).await?;
        }
        tracing::info!(policy = ?self.policy, "Schema ensured");
        Ok(())
    }
}
