//! Subcommand dispatch. Each command maps onto one graph operation and
//! renders its result as JSON.

use clap::Subcommand;
use serde_json::{json, Value};

use kinmap_core::{BirthYear, LocationId, PersonId, DEFAULT_PERSON_LIMIT};
use kinmap_graph::{GraphError, GraphStore, PeopleGraph};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create indexes (or uniqueness constraints) for the configured entity policy.
    Init,
    /// Add a person.
    AddPerson {
        name: String,
    },
    /// Add a location.
    AddLocation {
        city: String,
        state: String,
    },
    /// Make two people, given by name, friends.
    Friends {
        name1: String,
        name2: String,
    },
    /// Make two people, given by id, friends.
    FriendsById {
        a: i64,
        b: i64,
    },
    /// Record where a person, given by name, was born.
    BornIn {
        name: String,
        city: String,
        state: String,
        /// Birth year, e.g. 1984.
        #[arg(long)]
        year: String,
    },
    /// Record where a person was born, using ids.
    BornInById {
        person: i64,
        location: i64,
        #[arg(long)]
        year: String,
    },
    /// Show a person with their birthplace and friends.
    Show {
        id: i64,
    },
    /// List people and locations.
    List {
        /// Maximum number of people to list.
        #[arg(long, default_value_t = DEFAULT_PERSON_LIMIT)]
        limit: u32,
    },
}

/// Run `command` against `graph` and return what should be printed.
pub async fn execute<S: GraphStore>(
    graph: &PeopleGraph<S>,
    command: Command,
) -> anyhow::Result<Value> {
    let output = match command {
        Command::Init => {
            graph.ensure_schema().await?;
            json!({ "schema": "ok", "policy": graph.policy() })
        }
        Command::AddPerson { name } => {
            let id = graph.add_person(&name).await?;
            json!({ "person_id": id })
        }
        Command::AddLocation { city, state } => {
            let id = graph.add_location(&city, &state).await?;
            json!({ "location_id": id })
        }
        Command::Friends { name1, name2 } => {
            let linked = graph.connect_friends(&name1, &name2).await?;
            json!({ "friends": linked })
        }
        Command::FriendsById { a, b } => {
            let linked = graph
                .connect_friends_by_id(PersonId(a), PersonId(b))
                .await?;
            json!({ "friends": linked })
        }
        Command::BornIn {
            name,
            city,
            state,
            year,
        } => {
            let year = BirthYear::parse(&year).map_err(GraphError::from)?;
            let linked = graph.connect_born_in(&name, &city, &state, year).await?;
            json!({ "born_in": linked })
        }
        Command::BornInById {
            person,
            location,
            year,
        } => {
            let year = BirthYear::parse(&year).map_err(GraphError::from)?;
            let linked = graph
                .connect_born_in_by_id(PersonId(person), LocationId(location), year)
                .await?;
            json!({ "born_in": linked })
        }
        Command::Show { id } => serde_json::to_value(graph.person_view(PersonId(id)).await?)?,
        Command::List { limit } => serde_json::to_value(graph.overview(limit).await?)?,
    };
    Ok(output)
}
