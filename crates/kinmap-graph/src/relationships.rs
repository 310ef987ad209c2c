//! Relationship service: FRIENDS and BORN_IN edges.
//!
//! Both edge kinds use MERGE (match-or-create) semantics, so repeating a
//! connect never produces a second edge. Endpoints given by name must
//! resolve to exactly one node.

use kinmap_core::types::required;
use kinmap_core::{BirthYear, Linked, LocationId, PersonId, ValidationError};

use crate::cypher;
use crate::error::{GraphError, Result};
use crate::store::{GraphStore, Row, Statement};
use crate::PeopleGraph;

impl<S: GraphStore> PeopleGraph<S> {
    // ── FRIENDS ──────────────────────────────────────────────────

    /// Make the people named `name1` and `name2` friends.
    ///
    /// An existing FRIENDS edge in either direction satisfies the request.
    /// A new edge points from `name1` to `name2`.
    pub async fn connect_friends(&self, name1: &str, name2: &str) -> Result<Linked> {
        let name1 = required("name1", name1)?;
        let name2 = required("name2", name2)?;
        if name1 == name2 {
            return Err(ValidationError::SelfFriendship { name: name1 }.into());
        }

        let a = self.find_person(&name1).await?;
        let b = self.find_person(&name2).await?;
        self.merge_friends(a, b).await
    }

    /// Same as [`connect_friends`](Self::connect_friends) with explicit ids.
    pub async fn connect_friends_by_id(&self, a: PersonId, b: PersonId) -> Result<Linked> {
        if a == b {
            return Err(ValidationError::SelfFriendship {
                name: a.to_string(),
            }
            .into());
        }
        self.get_person(a).await?;
        self.get_person(b).await?;
        self.merge_friends(a, b).await
    }

    async fn merge_friends(&self, a: PersonId, b: PersonId) -> Result<Linked> {
        let q = Statement::new(&cypher::MERGE_FRIENDS)
            .param("a", a.0)
            .param("b", b.0);
        let rows = self.store.run(q).await?;

        // No row: one of the people vanished after it was resolved.
        let row = rows
            .first()
            .ok_or_else(|| GraphError::not_found("Person", format!("{a} or {b}")))?;
        let linked = merge_outcome(row)?;
        tracing::info!(from = a.0, to = b.0, ?linked, "Connected friends");
        Ok(linked)
    }

    // ── BORN_IN ──────────────────────────────────────────────────

    /// Record that the person named `name` was born in `(city, state)`.
    ///
    /// A person has at most one birthplace: connecting them to a different
    /// location fails with [`GraphError::BirthplaceConflict`]. Repeating the
    /// same connect is a no-op that keeps the originally recorded year.
    pub async fn connect_born_in(
        &self,
        name: &str,
        city: &str,
        state: &str,
        year: BirthYear,
    ) -> Result<Linked> {
        let person = self.find_person(name).await?;
        let location = self.find_location(city, state).await?;
        self.merge_born_in(person, location, year).await
    }

    /// Same as [`connect_born_in`](Self::connect_born_in) with explicit ids.
    pub async fn connect_born_in_by_id(
        &self,
        person: PersonId,
        location: LocationId,
        year: BirthYear,
    ) -> Result<Linked> {
        self.get_person(person).await?;
        self.get_location(location).await?;
        self.merge_born_in(person, location, year).await
    }

    async fn merge_born_in(
        &self,
        person: PersonId,
        location: LocationId,
        year: BirthYear,
    ) -> Result<Linked> {
        let q = Statement::new(&cypher::MERGE_BORN_IN)
            .param("person", person.0)
            .param("location", location.0)
            .param("year", year.value());
        let rows = self.store.run(q).await?;

        let Some(row) = rows.first() else {
            // An endpoint vanished after it was resolved; report which one.
            self.get_person(person).await?;
            return Err(GraphError::not_found("Location", location));
        };
        if let Some(existing) = row.opt_int("conflict")? {
            let existing = LocationId(existing);
            tracing::warn!(
                person_id = person.0,
                existing = existing.0,
                requested = location.0,
                "Person already has a birthplace"
            );
            return Err(GraphError::BirthplaceConflict { person, existing });
        }

        let linked = merge_outcome(row)?;
        let stored = row.int("year")?;
        if stored != year.value() {
            tracing::debug!(
                person_id = person.0,
                stored,
                requested = year.value(),
                "BORN_IN edge exists, keeping recorded year"
            );
        }
        tracing::info!(
            person_id = person.0,
            location_id = location.0,
            year = stored,
            ?linked,
            "Connected birthplace"
        );
        Ok(linked)
    }
}

/// Interpret the `before` count returned by a relationship MERGE.
fn merge_outcome(row: &Row) -> Result<Linked> {
    Ok(if row.int("before")? == 0 {
        Linked::Created
    } else {
        Linked::Existing
    })
}
