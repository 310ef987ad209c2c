//! CLI entry point for the kinmap people graph.
//!
//! Prints each command's result as JSON on stdout; logs go to stderr.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use kinmap_core::config::Settings;
use kinmap_graph::{GraphClient, GraphConfig, GraphError, PeopleGraph};

mod commands;

use commands::{execute, Command};

#[derive(Parser, Debug)]
#[command(name = "kinmap")]
#[command(about = "People, places, and friendships in a Neo4j graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: kinmap).
    #[arg(short, long, default_value = "kinmap", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = Settings::load(&cli.config)?;
    let client = GraphClient::connect(&GraphConfig::from(&settings.neo4j)).await?;
    let graph = PeopleGraph::from_settings(client, &settings.graph);

    tracing::debug!(command = ?cli.command, "Executing command");
    let output = match execute(&graph, cli.command).await {
        Ok(output) => output,
        Err(e) => match e.downcast_ref::<GraphError>() {
            // Bad input, unknown or ambiguous names: report and exit 2.
            Some(graph_err) if graph_err.is_client_error() => {
                tracing::warn!(error = %graph_err, "Request rejected");
                eprintln!("error: {graph_err}");
                std::process::exit(2);
            }
            _ => return Err(e),
        },
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_born_in() {
        let cli = Cli::try_parse_from([
            "kinmap", "born-in", "Alice", "Boston", "MA", "--year", "1990",
        ])
        .unwrap();
        assert_eq!(cli.config, "kinmap");
        match cli.command {
            Command::BornIn {
                name, state, year, ..
            } => {
                assert_eq!(name, "Alice");
                assert_eq!(state, "MA");
                assert_eq!(year, "1990");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_defaults_to_fifteen() {
        let cli = Cli::try_parse_from(["kinmap", "list", "--config", "alt"]).unwrap();
        assert_eq!(cli.config, "alt");
        assert!(matches!(cli.command, Command::List { limit: 15 }));
    }

    #[test]
    fn test_born_in_requires_year() {
        assert!(Cli::try_parse_from(["kinmap", "born-in", "Alice", "Boston", "MA"]).is_err());
    }
}
