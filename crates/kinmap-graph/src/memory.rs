//! In-process implementation of [`GraphStore`].
//!
//! Interprets the statement catalogue directly over adjacency lists held
//! behind a `tokio::sync::RwLock`. Every statement runs under the write
//! lock, so match-or-create is atomic just as MERGE is in Neo4j. Latency
//! can be injected per query, and statement deadlines are honoured.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cypher::QueryId;
use crate::store::{with_deadline, GraphStore, NodeRecord, Row, Statement, StoreError, Value};

#[derive(Debug, Default)]
struct MemoryGraph {
    next_id: i64,
    persons: BTreeMap<i64, String>,
    locations: BTreeMap<i64, (String, String)>,
    /// Directed FRIENDS edges `(from, to)`.
    friends: Vec<(i64, i64)>,
    /// BORN_IN edges `(person, location, year)`.
    born_in: Vec<(i64, i64, i64)>,
}

impl MemoryGraph {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn person_ids(&self, name: &str) -> Vec<i64> {
        self.persons
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
            .collect()
    }

    fn location_ids(&self, city: &str, state: &str) -> Vec<i64> {
        self.locations
            .iter()
            .filter(|(_, (c, s))| c == city && s == state)
            .map(|(id, _)| *id)
            .collect()
    }

    fn person_node(&self, id: i64) -> Option<NodeRecord> {
        self.persons
            .get(&id)
            .map(|name| NodeRecord::new(id).with_property("name", name.as_str()))
    }

    fn friends_of(&self, id: i64) -> Vec<i64> {
        let mut out: Vec<i64> = self
            .friends
            .iter()
            .filter_map(|&(a, b)| match (a == id, b == id) {
                (true, _) => Some(b),
                (_, true) => Some(a),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn birthplaces_of(&self, person: i64) -> Vec<(i64, i64)> {
        let mut out: Vec<(i64, i64)> = self
            .born_in
            .iter()
            .filter(|(p, _, _)| *p == person)
            .map(|&(_, l, y)| (l, y))
            .collect();
        out.sort_unstable();
        out
    }
}

/// A graph store that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: RwLock<MemoryGraph>,
    failing: RwLock<HashSet<QueryId>>,
    delays: RwLock<HashMap<QueryId, Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent run of `query` fail with [`StoreError::Injected`].
    pub async fn fail_on(&self, query: QueryId) {
        self.failing.write().await.insert(query);
    }

    /// Sleep for `delay` before every subsequent run of `query`, outside the
    /// graph lock, as a round trip to a real server would.
    pub async fn delay_on(&self, query: QueryId, delay: Duration) {
        self.delays.write().await.insert(query, delay);
    }

    /// Number of stored FRIENDS edges, counting each direction separately.
    pub async fn friendship_count(&self) -> usize {
        self.graph.read().await.friends.len()
    }

    /// Number of stored BORN_IN edges.
    pub async fn birth_edge_count(&self) -> usize {
        self.graph.read().await.born_in.len()
    }

    pub async fn person_count(&self) -> usize {
        self.graph.read().await.persons.len()
    }

    /// Directed FRIENDS edges as `(from, to)` pairs, in creation order.
    pub async fn friend_edges(&self) -> Vec<(i64, i64)> {
        self.graph.read().await.friends.clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn run(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        if self.failing.read().await.contains(&statement.id()) {
            return Err(StoreError::Injected {
                statement: statement.id(),
            });
        }

        let delay = self.delays.read().await.get(&statement.id()).copied();
        let work = async {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.execute(&statement).await
        };
        match statement.timeout() {
            Some(deadline) => with_deadline(statement.id(), deadline, work).await,
            None => work.await,
        }
    }
}

impl MemoryStore {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let mut g = self.graph.write().await;
        let id_row = |id: i64| Row::new().with("id", Value::Int(id));

        let rows = match statement.id() {
            QueryId::PersonNameIndex
            | QueryId::LocationKeyIndex
            | QueryId::PersonNameUnique
            | QueryId::LocationKeyUnique => Vec::new(),

            QueryId::CreatePerson => {
                let name = statement.str_param("name")?.to_string();
                let id = g.allocate();
                g.persons.insert(id, name);
                vec![id_row(id)]
            }
            QueryId::MergePerson => {
                let name = statement.str_param("name")?;
                let mut ids = g.person_ids(name);
                if ids.is_empty() {
                    let id = g.allocate();
                    g.persons.insert(id, name.to_string());
                    ids.push(id);
                }
                ids.into_iter().map(id_row).collect()
            }
            QueryId::CreateLocation => {
                let city = statement.str_param("city")?.to_string();
                let state = statement.str_param("state")?.to_string();
                let id = g.allocate();
                g.locations.insert(id, (city, state));
                vec![id_row(id)]
            }
            QueryId::MergeLocation => {
                let city = statement.str_param("city")?;
                let state = statement.str_param("state")?;
                let mut ids = g.location_ids(city, state);
                if ids.is_empty() {
                    let id = g.allocate();
                    g.locations
                        .insert(id, (city.to_string(), state.to_string()));
                    ids.push(id);
                }
                ids.into_iter().map(id_row).collect()
            }
            QueryId::FindPersonsByName => {
                let name = statement.str_param("name")?;
                g.person_ids(name).into_iter().map(id_row).collect()
            }
            QueryId::FindLocationsByKey => {
                let city = statement.str_param("city")?;
                let state = statement.str_param("state")?;
                g.location_ids(city, state).into_iter().map(id_row).collect()
            }
            QueryId::PersonById => {
                let id = statement.int_param("id")?;
                g.persons
                    .get(&id)
                    .map(|name| Row::new().with("name", Value::Str(name.clone())))
                    .into_iter()
                    .collect()
            }
            QueryId::LocationById => {
                let id = statement.int_param("id")?;
                g.locations
                    .get(&id)
                    .map(|(city, state)| {
                        Row::new()
                            .with("city", Value::Str(city.clone()))
                            .with("state", Value::Str(state.clone()))
                    })
                    .into_iter()
                    .collect()
            }

            QueryId::MergeFriends => {
                let a = statement.int_param("a")?;
                let b = statement.int_param("b")?;
                if !g.persons.contains_key(&a) || !g.persons.contains_key(&b) {
                    Vec::new()
                } else {
                    let before = g
                        .friends
                        .iter()
                        .filter(|&&(x, y)| (x == a && y == b) || (x == b && y == a))
                        .count();
                    if before == 0 {
                        g.friends.push((a, b));
                    }
                    vec![Row::new().with("before", Value::Int(before as i64))]
                }
            }
            QueryId::MergeBornIn => {
                let person = statement.int_param("person")?;
                let location = statement.int_param("location")?;
                let year = statement.int_param("year")?;
                if !g.persons.contains_key(&person) || !g.locations.contains_key(&location) {
                    Vec::new()
                } else {
                    let conflict = g
                        .born_in
                        .iter()
                        .filter(|&&(p, l, _)| p == person && l != location)
                        .map(|&(_, l, _)| l)
                        .min();
                    let existing: Vec<i64> = g
                        .born_in
                        .iter()
                        .filter(|&&(p, l, _)| p == person && l == location)
                        .map(|&(_, _, y)| y)
                        .collect();
                    let stored = match (existing.first(), conflict) {
                        (Some(&y), _) => Some(y),
                        (None, None) => {
                            g.born_in.push((person, location, year));
                            Some(year)
                        }
                        (None, Some(_)) => None,
                    };
                    vec![Row::new()
                        .with("conflict", conflict.map_or(Value::Null, Value::Int))
                        .with("before", Value::Int(existing.len() as i64))
                        .with("year", stored.map_or(Value::Null, Value::Int))]
                }
            }

            QueryId::PersonBirthplace => {
                let id = statement.int_param("id")?;
                g.birthplaces_of(id)
                    .into_iter()
                    .filter_map(|(location, year)| {
                        g.locations.get(&location).map(|(city, state)| {
                            Row::new()
                                .with("city", Value::Str(city.clone()))
                                .with("state", Value::Str(state.clone()))
                                .with("year", Value::Int(year))
                        })
                    })
                    .take(1)
                    .collect()
            }
            QueryId::PersonFriends => {
                let id = statement.int_param("id")?;
                if !g.persons.contains_key(&id) {
                    Vec::new()
                } else {
                    g.friends_of(id)
                        .into_iter()
                        .filter_map(|f| g.person_node(f))
                        .map(|node| Row::new().with("f", Value::Node(node)))
                        .collect()
                }
            }

            QueryId::ListPersons => {
                let limit = statement.int_param("limit")?.max(0) as usize;
                g.persons
                    .keys()
                    .take(limit)
                    .filter_map(|&id| g.person_node(id))
                    .map(|node| Row::new().with("p", Value::Node(node)))
                    .collect()
            }
            QueryId::ListLocations => {
                let mut locations: Vec<(&String, &String, i64)> = g
                    .locations
                    .iter()
                    .map(|(id, (city, state))| (state, city, *id))
                    .collect();
                locations.sort();
                locations
                    .into_iter()
                    .map(|(state, city, id)| {
                        let node = NodeRecord::new(id)
                            .with_property("city", city.as_str())
                            .with_property("state", state.as_str());
                        Row::new().with("l", Value::Node(node))
                    })
                    .collect()
            }
        };

        tracing::trace!(statement = ?statement.id(), rows = rows.len(), "Ran in-memory statement");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher;

    #[tokio::test]
    async fn merge_person_reuses_existing_node() {
        let store = MemoryStore::new();
        let first = store
            .run(Statement::new(&cypher::MERGE_PERSON).param("name", "Alice"))
            .await
            .unwrap();
        let second = store
            .run(Statement::new(&cypher::MERGE_PERSON).param("name", "Alice"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.person_count().await, 1);
    }

    #[tokio::test]
    async fn merge_friends_matches_either_direction() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["Alice", "Bob"] {
            let rows = store
                .run(Statement::new(&cypher::CREATE_PERSON).param("name", name))
                .await
                .unwrap();
            ids.push(rows[0].int("id").unwrap());
        }

        let forward = Statement::new(&cypher::MERGE_FRIENDS)
            .param("a", ids[0])
            .param("b", ids[1]);
        let backward = Statement::new(&cypher::MERGE_FRIENDS)
            .param("a", ids[1])
            .param("b", ids[0]);

        let rows = store.run(forward).await.unwrap();
        assert_eq!(rows[0].int("before").unwrap(), 0);
        let rows = store.run(backward).await.unwrap();
        assert_eq!(rows[0].int("before").unwrap(), 1);
        assert_eq!(store.friend_edges().await, vec![(ids[0], ids[1])]);
    }

    #[tokio::test]
    async fn injected_failure_is_reported() {
        let store = MemoryStore::new();
        store.fail_on(QueryId::ListLocations).await;
        let err = store
            .run(Statement::new(&cypher::LIST_LOCATIONS))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Injected {
                statement: QueryId::ListLocations
            }
        ));
    }

    #[tokio::test]
    async fn missing_param_is_an_error_not_a_panic() {
        let store = MemoryStore::new();
        let err = store
            .run(Statement::new(&cypher::CREATE_PERSON))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingParam { param: "name", .. }));
    }

    #[tokio::test]
    async fn merge_born_in_refuses_a_second_location() {
        let store = MemoryStore::new();
        let person = store
            .run(Statement::new(&cypher::CREATE_PERSON).param("name", "Alice"))
            .await
            .unwrap()[0]
            .int("id")
            .unwrap();
        let mut locations = Vec::new();
        for city in ["Boston", "Austin"] {
            let rows = store
                .run(
                    Statement::new(&cypher::CREATE_LOCATION)
                        .param("city", city)
                        .param("state", "XX"),
                )
                .await
                .unwrap();
            locations.push(rows[0].int("id").unwrap());
        }
        let born_in = |location: i64| {
            Statement::new(&cypher::MERGE_BORN_IN)
                .param("person", person)
                .param("location", location)
                .param("year", 1990_i64)
        };

        let rows = store.run(born_in(locations[0])).await.unwrap();
        assert_eq!(rows[0].opt_int("conflict").unwrap(), None);
        assert_eq!(rows[0].int("before").unwrap(), 0);

        let rows = store.run(born_in(locations[1])).await.unwrap();
        assert_eq!(rows[0].opt_int("conflict").unwrap(), Some(locations[0]));
        assert_eq!(rows[0].opt_int("year").unwrap(), None);
        assert_eq!(store.birth_edge_count().await, 1);
    }

    #[tokio::test]
    async fn statement_deadline_is_enforced() {
        let store = MemoryStore::new();
        store
            .delay_on(QueryId::ListPersons, Duration::from_millis(500))
            .await;

        let slow = Statement::new(&cypher::LIST_PERSONS)
            .param("limit", 5_i64)
            .deadline(Duration::from_millis(20));
        let err = store.run(slow).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Timeout {
                statement: QueryId::ListPersons,
                timeout_ms: 20
            }
        ));

        // The abandoned statement holds nothing; the store stays usable.
        store
            .run(
                Statement::new(&cypher::CREATE_PERSON)
                    .param("name", "Alice")
                    .deadline(Duration::from_millis(500)),
            )
            .await
            .unwrap();
        assert_eq!(store.person_count().await, 1);
    }
}
