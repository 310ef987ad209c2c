//! Person view assembly.

use kinmap_core::{Person, PersonId, PersonView};

use crate::cypher;
use crate::entities::person_from_node;
use crate::error::Result;
use crate::store::{GraphStore, Statement};
use crate::PeopleGraph;

/// Birthplace columns of a [`PersonView`].
type Birthplace = (Option<String>, Option<String>, Option<i64>);

impl<S: GraphStore> PeopleGraph<S> {
    /// Assemble a person's identity, birthplace, and friends.
    ///
    /// Fails with `NotFound` for an unknown id. The birthplace and friends
    /// traversals run concurrently once the person resolves; if either
    /// fails, the whole view fails.
    pub async fn person_view(&self, id: PersonId) -> Result<PersonView> {
        let person = self.get_person(id).await?;
        let (birthplace, friends) = tokio::try_join!(self.birthplace(id), self.friends(id))?;
        let (city, state, year) = birthplace;

        tracing::debug!(person_id = id.0, friends = friends.len(), "Assembled person view");
        Ok(PersonView {
            id,
            name: person.name,
            city,
            state,
            year,
            friends,
        })
    }

    async fn birthplace(&self, id: PersonId) -> Result<Birthplace> {
        let rows = self
            .store
            .run(Statement::new(&cypher::PERSON_BIRTHPLACE).param("id", id.0))
            .await?;
        match rows.first() {
            Some(row) => Ok((
                row.opt_string("city")?,
                row.opt_string("state")?,
                row.opt_int("year")?,
            )),
            None => Ok((None, None, None)),
        }
    }

    /// Friends in either edge direction, distinct, ordered by id.
    pub async fn friends(&self, id: PersonId) -> Result<Vec<Person>> {
        let rows = self
            .store
            .run(Statement::new(&cypher::PERSON_FRIENDS).param("id", id.0))
            .await?;
        let mut friends = Vec::with_capacity(rows.len());
        for row in &rows {
            friends.push(person_from_node(row.node("f")?)?);
        }
        Ok(friends)
    }
}
