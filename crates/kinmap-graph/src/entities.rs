//! Entity repository: Person and Location nodes.
//!
//! What "add" means for a key that already exists is decided by the
//! graph's [`EntityPolicy`]. Lookups by key always demand exactly one match.

use kinmap_core::types::required;
use kinmap_core::{EntityPolicy, Location, LocationId, Person, PersonId};

use crate::cypher;
use crate::error::{GraphError, Result};
use crate::store::{GraphStore, NodeRecord, Row, Statement, StoreError};
use crate::PeopleGraph;

impl<S: GraphStore> PeopleGraph<S> {
    // ── Creation ─────────────────────────────────────────────────

    /// Add a person, returning the id of the node that now carries `name`.
    ///
    /// Under [`EntityPolicy::MergeOnName`] an existing person with the same
    /// name is reused; under [`EntityPolicy::AlwaysInsert`] a new node is
    /// created every time.
    pub async fn add_person(&self, name: &str) -> Result<PersonId> {
        let name = required("name", name)?;
        let query = match self.policy {
            EntityPolicy::MergeOnName => &cypher::MERGE_PERSON,
            EntityPolicy::AlwaysInsert => &cypher::CREATE_PERSON,
        };

        let rows = self
            .store
            .run(Statement::new(query).param("name", name.as_str()))
            .await?;
        let id = PersonId(first_id(&rows, "Person", &name)?);

        tracing::info!(person_id = id.0, name = %name, policy = ?self.policy, "Added person");
        Ok(id)
    }

    /// Add a location keyed by `(city, state)`, under the same policy as people.
    pub async fn add_location(&self, city: &str, state: &str) -> Result<LocationId> {
        let city = required("city", city)?;
        let state = required("state", state)?;
        let query = match self.policy {
            EntityPolicy::MergeOnName => &cypher::MERGE_LOCATION,
            EntityPolicy::AlwaysInsert => &cypher::CREATE_LOCATION,
        };

        let q = Statement::new(query)
            .param("city", city.as_str())
            .param("state", state.as_str());
        let rows = self.store.run(q).await?;
        let id = LocationId(first_id(&rows, "Location", &location_key(&city, &state))?);

        tracing::info!(location_id = id.0, city = %city, state = %state, "Added location");
        Ok(id)
    }

    // ── Lookups ──────────────────────────────────────────────────

    /// Resolve a name to the single person carrying it.
    pub async fn find_person(&self, name: &str) -> Result<PersonId> {
        let name = required("name", name)?;
        let rows = self
            .store
            .run(Statement::new(&cypher::FIND_PERSONS_BY_NAME).param("name", name.as_str()))
            .await?;
        exactly_one(&rows, "Person", name).map(PersonId)
    }

    /// Resolve `(city, state)` to the single location carrying it.
    pub async fn find_location(&self, city: &str, state: &str) -> Result<LocationId> {
        let city = required("city", city)?;
        let state = required("state", state)?;
        let q = Statement::new(&cypher::FIND_LOCATIONS_BY_KEY)
            .param("city", city.as_str())
            .param("state", state.as_str());
        let rows = self.store.run(q).await?;
        exactly_one(&rows, "Location", location_key(&city, &state)).map(LocationId)
    }

    /// Get a person by id.
    pub async fn get_person(&self, id: PersonId) -> Result<Person> {
        let rows = self
            .store
            .run(Statement::new(&cypher::PERSON_BY_ID).param("id", id.0))
            .await?;
        match rows.first() {
            Some(row) => Ok(Person {
                id,
                name: row.string("name")?,
            }),
            None => Err(GraphError::not_found("Person", id)),
        }
    }

    /// Get a location by id.
    pub async fn get_location(&self, id: LocationId) -> Result<Location> {
        let rows = self
            .store
            .run(Statement::new(&cypher::LOCATION_BY_ID).param("id", id.0))
            .await?;
        match rows.first() {
            Some(row) => Ok(Location {
                id,
                city: row.string("city")?,
                state: row.string("state")?,
            }),
            None => Err(GraphError::not_found("Location", id)),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn location_key(city: &str, state: &str) -> String {
    format!("{city}, {state}")
}

/// The id from the first row of a create/merge. A merge over a key that
/// already has duplicates yields one row per node; the lowest id wins.
fn first_id(rows: &[Row], label: &'static str, key: &str) -> Result<i64> {
    if rows.len() > 1 {
        tracing::warn!(label, key, count = rows.len(), "Merge matched duplicate nodes");
    }
    let row = rows.first().ok_or(StoreError::Decode {
        field: "id",
        reason: format!("create/merge of {label} returned no rows"),
    })?;
    Ok(row.int("id")?)
}

fn exactly_one(rows: &[Row], label: &'static str, key: String) -> Result<i64> {
    match rows {
        [] => Err(GraphError::NotFound { label, key }),
        [row] => Ok(row.int("id")?),
        _ => {
            tracing::warn!(label, key = %key, count = rows.len(), "Ambiguous lookup");
            Err(GraphError::AmbiguousMatch {
                label,
                key,
                count: rows.len(),
            })
        }
    }
}

pub(crate) fn person_from_node(node: &NodeRecord) -> std::result::Result<Person, StoreError> {
    Ok(Person {
        id: PersonId(node.id),
        name: node.str_property("name")?,
    })
}

pub(crate) fn location_from_node(node: &NodeRecord) -> std::result::Result<Location, StoreError> {
    Ok(Location {
        id: LocationId(node.id),
        city: node.str_property("city")?,
        state: node.str_property("state")?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kinmap_core::ValidationError;

    use super::*;
    use crate::MemoryStore;

    fn graph(policy: EntityPolicy) -> (Arc<MemoryStore>, PeopleGraph<Arc<MemoryStore>>) {
        let store = Arc::new(MemoryStore::new());
        let graph = PeopleGraph::new(store.clone()).with_policy(policy);
        (store, graph)
    }

    #[tokio::test]
    async fn merge_on_name_reuses_the_person() {
        let (store, graph) = graph(EntityPolicy::MergeOnName);
        let first = graph.add_person("Alice").await.unwrap();
        let second = graph.add_person("  Alice ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.person_count().await, 1);
        assert_eq!(graph.find_person("Alice").await.unwrap(), first);
    }

    #[tokio::test]
    async fn always_insert_creates_duplicates() {
        let (store, graph) = graph(EntityPolicy::AlwaysInsert);
        let first = graph.add_person("Alice").await.unwrap();
        let second = graph.add_person("Alice").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.person_count().await, 2);

        let err = graph.find_person("Alice").await.unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousMatch { count: 2, .. }));
    }

    #[tokio::test]
    async fn blank_names_are_rejected_before_the_store() {
        let (store, graph) = graph(EntityPolicy::MergeOnName);
        let err = graph.add_person("   ").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::Invalid(ValidationError::Empty { field: "name" })
        ));
        let err = graph.add_location("Austin", "").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::Invalid(ValidationError::Empty { field: "state" })
        ));
        assert_eq!(store.person_count().await, 0);
    }

    #[tokio::test]
    async fn locations_are_keyed_by_city_and_state() {
        let (_, graph) = graph(EntityPolicy::MergeOnName);
        let portland_or = graph.add_location("Portland", "OR").await.unwrap();
        let portland_me = graph.add_location("Portland", "ME").await.unwrap();
        assert_ne!(portland_or, portland_me);
        assert_eq!(graph.add_location("Portland", "OR").await.unwrap(), portland_or);

        let found = graph.get_location(portland_me).await.unwrap();
        assert_eq!(found.city, "Portland");
        assert_eq!(found.state, "ME");
    }

    #[tokio::test]
    async fn adding_a_person_creates_no_location() {
        let (_, graph) = graph(EntityPolicy::MergeOnName);
        graph.add_person("Alice").await.unwrap();
        assert!(graph.list_locations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_lookups_are_not_found() {
        let (_, graph) = graph(EntityPolicy::MergeOnName);
        assert!(matches!(
            graph.find_person("Nobody").await,
            Err(GraphError::NotFound { label: "Person", .. })
        ));
        assert!(matches!(
            graph.get_location(LocationId(404)).await,
            Err(GraphError::NotFound { label: "Location", .. })
        ));
    }
}
