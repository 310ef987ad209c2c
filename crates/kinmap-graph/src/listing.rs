//! Overview listings. Small-display reads only: no pagination cursor.

use kinmap_core::{Location, Overview, Person};

use crate::cypher;
use crate::entities::{location_from_node, person_from_node};
use crate::error::Result;
use crate::store::{GraphStore, Statement};
use crate::PeopleGraph;

impl<S: GraphStore> PeopleGraph<S> {
    /// List people ordered by id, at most `limit` of them (further capped by
    /// the graph's configured maximum).
    pub async fn list_persons(&self, limit: u32) -> Result<Vec<Person>> {
        let limit = limit.min(self.max_person_limit);
        let rows = self
            .store
            .run(Statement::new(&cypher::LIST_PERSONS).param("limit", i64::from(limit)))
            .await?;

        let mut persons = Vec::with_capacity(rows.len());
        for row in rows.iter().take(limit as usize) {
            persons.push(person_from_node(row.node("p")?)?);
        }
        Ok(persons)
    }

    /// List every location, ordered by state, then city.
    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let rows = self
            .store
            .run(Statement::new(&cypher::LIST_LOCATIONS))
            .await?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in &rows {
            locations.push(location_from_node(row.node("l")?)?);
        }
        Ok(locations)
    }

    /// The home-page listing: a page of people and all locations.
    pub async fn overview(&self, person_limit: u32) -> Result<Overview> {
        let (persons, locations) =
            tokio::try_join!(self.list_persons(person_limit), self.list_locations())?;
        tracing::debug!(
            persons = persons.len(),
            locations = locations.len(),
            "Built overview"
        );
        Ok(Overview { persons, locations })
    }
}
