//! End-to-end behaviour of the people graph over the in-memory store.

use std::sync::Arc;

use kinmap_core::{BirthYear, EntityPolicy, Linked, PersonId, DEFAULT_PERSON_LIMIT};
use kinmap_graph::{GraphError, MemoryStore, PeopleGraph};

fn people(policy: EntityPolicy) -> (Arc<MemoryStore>, PeopleGraph<Arc<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    let graph = PeopleGraph::new(store.clone()).with_policy(policy);
    (store, graph)
}

#[tokio::test]
async fn test_add_person_round_trips_through_view() {
    let (_, graph) = people(EntityPolicy::MergeOnName);
    graph.add_person("Alice").await.unwrap();

    let id = graph.find_person("Alice").await.unwrap();
    let view = graph.person_view(id).await.unwrap();
    assert_eq!(view.id, id);
    assert_eq!(view.name, "Alice");
    assert!(view.friends.is_empty());
}

#[tokio::test]
async fn test_friendship_reads_from_both_sides() {
    let (_, graph) = people(EntityPolicy::MergeOnName);
    let alice = graph.add_person("Alice").await.unwrap();
    let bob = graph.add_person("Bob").await.unwrap();

    graph.connect_friends("Alice", "Bob").await.unwrap();

    let alice_view = graph.person_view(alice).await.unwrap();
    assert!(alice_view.friends.iter().any(|f| f.name == "Bob"));

    let bob_view = graph.person_view(bob).await.unwrap();
    assert!(bob_view.friends.iter().any(|f| f.name == "Alice"));
}

#[tokio::test]
async fn test_connects_are_idempotent() {
    let (store, graph) = people(EntityPolicy::MergeOnName);
    graph.add_person("Alice").await.unwrap();
    graph.add_person("Bob").await.unwrap();
    graph.add_location("Tulsa", "OK").await.unwrap();
    let year = BirthYear::parse("1962").unwrap();

    for _ in 0..3 {
        graph.connect_friends("Alice", "Bob").await.unwrap();
        graph
            .connect_born_in("Alice", "Tulsa", "OK", year)
            .await
            .unwrap();
    }

    assert_eq!(store.friendship_count().await, 1);
    assert_eq!(store.birth_edge_count().await, 1);

    let alice = graph.find_person("Alice").await.unwrap();
    let view = graph.person_view(alice).await.unwrap();
    assert_eq!(view.year, Some(1962));
}

#[tokio::test]
async fn test_concurrent_connects_create_one_edge() {
    let (store, graph) = people(EntityPolicy::MergeOnName);
    graph.add_person("Alice").await.unwrap();
    graph.add_person("Bob").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let graph = graph.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                graph.connect_friends("Alice", "Bob").await
            } else {
                graph.connect_friends("Bob", "Alice").await
            }
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == Linked::Created {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.friendship_count().await, 1);
}

#[tokio::test]
async fn test_unknown_person_view_is_not_found() {
    let (_, graph) = people(EntityPolicy::MergeOnName);
    let err = graph.person_view(PersonId(77)).await.unwrap_err();
    assert!(matches!(err, GraphError::NotFound { .. }));
}

#[tokio::test]
async fn test_person_without_birthplace_has_null_location() {
    let (_, graph) = people(EntityPolicy::MergeOnName);
    let id = graph.add_person("Dana").await.unwrap();
    graph.add_location("Omaha", "NE").await.unwrap();

    let view = graph.person_view(id).await.unwrap();
    assert!(view.city.is_none());
    assert!(view.state.is_none());
}

#[tokio::test]
async fn test_listing_never_exceeds_cap() {
    let (_, graph) = people(EntityPolicy::AlwaysInsert);
    for _ in 0..16 {
        graph.add_person("Same Name").await.unwrap();
    }
    let persons = graph.list_persons(DEFAULT_PERSON_LIMIT).await.unwrap();
    assert_eq!(persons.len(), DEFAULT_PERSON_LIMIT as usize);
}

#[tokio::test]
async fn test_entity_policies_differ_on_duplicate_names() {
    let (merge_store, merge) = people(EntityPolicy::MergeOnName);
    let a = merge.add_person("Eve").await.unwrap();
    let b = merge.add_person("Eve").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(merge_store.person_count().await, 1);

    let (insert_store, insert) = people(EntityPolicy::AlwaysInsert);
    let a = insert.add_person("Eve").await.unwrap();
    let b = insert.add_person("Eve").await.unwrap();
    assert_ne!(a, b);
    assert_eq!(insert_store.person_count().await, 2);

    insert.add_person("Frank").await.unwrap();
    assert!(matches!(
        insert.connect_friends("Eve", "Frank").await,
        Err(GraphError::AmbiguousMatch { .. })
    ));
}

#[tokio::test]
async fn test_schema_setup_is_repeatable() {
    let (_, graph) = people(EntityPolicy::MergeOnName);
    graph.ensure_schema().await.unwrap();
    graph.ensure_schema().await.unwrap();
}
