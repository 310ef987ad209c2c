//! Cypher statement catalogue.
//!
//! Every query the crate issues lives here, with `$param` placeholders and
//! the fields each returned row carries.

/// Identifies a catalogued query independently of its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryId {
    PersonNameIndex,
    LocationKeyIndex,
    PersonNameUnique,
    LocationKeyUnique,
    CreatePerson,
    MergePerson,
    CreateLocation,
    MergeLocation,
    FindPersonsByName,
    FindLocationsByKey,
    PersonById,
    LocationById,
    MergeFriends,
    MergeBornIn,
    PersonBirthplace,
    PersonFriends,
    ListPersons,
    ListLocations,
}

/// How a returned field is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Str,
    /// A node; the listed properties are projected into the record.
    Node(&'static [&'static str]),
}

/// A query template and the shape of its rows.
#[derive(Debug)]
pub struct CypherQuery {
    pub id: QueryId,
    pub text: &'static str,
    pub fields: &'static [(&'static str, FieldKind)],
}

const PERSON_PROPS: &[&str] = &["name"];
const LOCATION_PROPS: &[&str] = &["city", "state"];

// ── Schema ───────────────────────────────────────────────────────

pub static PERSON_NAME_INDEX: CypherQuery = CypherQuery {
    id: QueryId::PersonNameIndex,
    text: "CREATE INDEX person_name IF NOT EXISTS FOR (p:Person) ON (p.name)",
    fields: &[],
};

pub static LOCATION_KEY_INDEX: CypherQuery = CypherQuery {
    id: QueryId::LocationKeyIndex,
    text: "CREATE INDEX location_key IF NOT EXISTS FOR (l:Location) ON (l.city, l.state)",
    fields: &[],
};

pub static PERSON_NAME_UNIQUE: CypherQuery = CypherQuery {
    id: QueryId::PersonNameUnique,
    text: "CREATE CONSTRAINT person_name_unique IF NOT EXISTS
           FOR (p:Person) REQUIRE p.name IS UNIQUE",
    fields: &[],
};

pub static LOCATION_KEY_UNIQUE: CypherQuery = CypherQuery {
    id: QueryId::LocationKeyUnique,
    text: "CREATE CONSTRAINT location_key_unique IF NOT EXISTS
           FOR (l:Location) REQUIRE (l.city, l.state) IS UNIQUE",
    fields: &[],
};

// ── Entities ─────────────────────────────────────────────────────

pub static CREATE_PERSON: CypherQuery = CypherQuery {
    id: QueryId::CreatePerson,
    text: "CREATE (p:Person {name: $name})
           RETURN id(p) AS id",
    fields: &[("id", FieldKind::Int)],
};

pub static MERGE_PERSON: CypherQuery = CypherQuery {
    id: QueryId::MergePerson,
    text: "MERGE (p:Person {name: $name})
           RETURN id(p) AS id
           ORDER BY id",
    fields: &[("id", FieldKind::Int)],
};

pub static CREATE_LOCATION: CypherQuery = CypherQuery {
    id: QueryId::CreateLocation,
    text: "CREATE (l:Location {city: $city, state: $state})
           RETURN id(l) AS id",
    fields: &[("id", FieldKind::Int)],
};

pub static MERGE_LOCATION: CypherQuery = CypherQuery {
    id: QueryId::MergeLocation,
    text: "MERGE (l:Location {city: $city, state: $state})
           RETURN id(l) AS id
           ORDER BY id",
    fields: &[("id", FieldKind::Int)],
};

pub static FIND_PERSONS_BY_NAME: CypherQuery = CypherQuery {
    id: QueryId::FindPersonsByName,
    text: "MATCH (p:Person {name: $name})
           RETURN id(p) AS id
           ORDER BY id",
    fields: &[("id", FieldKind::Int)],
};

pub static FIND_LOCATIONS_BY_KEY: CypherQuery = CypherQuery {
    id: QueryId::FindLocationsByKey,
    text: "MATCH (l:Location {city: $city, state: $state})
           RETURN id(l) AS id
           ORDER BY id",
    fields: &[("id", FieldKind::Int)],
};

pub static PERSON_BY_ID: CypherQuery = CypherQuery {
    id: QueryId::PersonById,
    text: "MATCH (p:Person)
           WHERE id(p) = $id
           RETURN p.name AS name",
    fields: &[("name", FieldKind::Str)],
};

pub static LOCATION_BY_ID: CypherQuery = CypherQuery {
    id: QueryId::LocationById,
    text: "MATCH (l:Location)
           WHERE id(l) = $id
           RETURN l.city AS city, l.state AS state",
    fields: &[("city", FieldKind::Str), ("state", FieldKind::Str)],
};

// ── Relationships ────────────────────────────────────────────────

/// Undirected MERGE: an edge in either direction satisfies the pattern,
/// and a new one is created `a -> b`. `before` is the count of edges
/// that already existed.
pub static MERGE_FRIENDS: CypherQuery = CypherQuery {
    id: QueryId::MergeFriends,
    text: "MATCH (a:Person), (b:Person)
           WHERE id(a) = $a AND id(b) = $b
           OPTIONAL MATCH (a)-[existing:FRIENDS]-(b)
           WITH a, b, count(existing) AS before
           MERGE (a)-[:FRIENDS]-(b)
           RETURN before",
    fields: &[("before", FieldKind::Int)],
};

/// Birthplace check and MERGE in one statement. Touching `p` first takes
/// its write lock, so concurrent connects for the same person serialize.
/// `conflict` is the id of another location `p` is already BORN_IN (null
/// if none); when set, nothing is written. The year is only written when
/// the edge is created; an existing edge keeps its original year.
pub static MERGE_BORN_IN: CypherQuery = CypherQuery {
    id: QueryId::MergeBornIn,
    text: "MATCH (p:Person), (l:Location)
           WHERE id(p) = $person AND id(l) = $location
           SET p._lock = true
           REMOVE p._lock
           WITH p, l
           OPTIONAL MATCH (p)-[:BORN_IN]->(other:Location)
           WHERE other <> l
           WITH p, l, min(id(other)) AS conflict
           OPTIONAL MATCH (p)-[existing:BORN_IN]->(l)
           WITH p, l, conflict, count(existing) AS before
           FOREACH (x IN CASE WHEN conflict IS NULL THEN [1] ELSE [] END |
               MERGE (p)-[r:BORN_IN]->(l)
               ON CREATE SET r.year = $year)
           WITH p, l, conflict, before
           OPTIONAL MATCH (p)-[r:BORN_IN]->(l)
           RETURN conflict, before, r.year AS year
           LIMIT 1",
    fields: &[
        ("conflict", FieldKind::Int),
        ("before", FieldKind::Int),
        ("year", FieldKind::Int),
    ],
};

// ── Person view ──────────────────────────────────────────────────

pub static PERSON_BIRTHPLACE: CypherQuery = CypherQuery {
    id: QueryId::PersonBirthplace,
    text: "MATCH (p:Person)-[r:BORN_IN]->(l:Location)
           WHERE id(p) = $id
           RETURN l.city AS city, l.state AS state, r.year AS year
           ORDER BY id(l)
           LIMIT 1",
    fields: &[
        ("city", FieldKind::Str),
        ("state", FieldKind::Str),
        ("year", FieldKind::Int),
    ],
};

pub static PERSON_FRIENDS: CypherQuery = CypherQuery {
    id: QueryId::PersonFriends,
    text: "MATCH (p:Person)-[:FRIENDS]-(f:Person)
           WHERE id(p) = $id
           RETURN DISTINCT f
           ORDER BY id(f)",
    fields: &[("f", FieldKind::Node(PERSON_PROPS))],
};

// ── Listings ─────────────────────────────────────────────────────

pub static LIST_PERSONS: CypherQuery = CypherQuery {
    id: QueryId::ListPersons,
    text: "MATCH (p:Person)
           RETURN p
           ORDER BY id(p)
           LIMIT $limit",
    fields: &[("p", FieldKind::Node(PERSON_PROPS))],
};

pub static LIST_LOCATIONS: CypherQuery = CypherQuery {
    id: QueryId::ListLocations,
    text: "MATCH (l:Location)
           RETURN l
           ORDER BY l.state, l.city, id(l)",
    fields: &[("l", FieldKind::Node(LOCATION_PROPS))],
};
