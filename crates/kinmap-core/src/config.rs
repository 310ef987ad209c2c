//! Configuration management for kinmap.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`KINMAP__` prefix, `__` between sections,
//!    e.g. `KINMAP__NEO4J__URI`)
//! 2. Config file (`kinmap.toml` by default)
//! 3. Defaults

use serde::Deserialize;

use crate::error::KinmapError;
use crate::types::EntityPolicy;

/// Environment variable prefix for all settings.
pub const ENV_PREFIX: &str = "KINMAP";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub graph: GraphSettings,
}

/// Connection settings for the Neo4j store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Size of the Bolt connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Deadline applied to every statement unless overridden per call.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

/// Behaviour of the people graph itself.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default)]
    pub entity_policy: EntityPolicy,

    /// Upper bound applied to any `list_persons` request.
    #[serde(default = "default_max_person_limit")]
    pub max_person_limit: u32,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "kinmap-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_query_timeout_ms() -> u64 {
    5_000
}

fn default_max_person_limit() -> u32 {
    100
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            entity_policy: EntityPolicy::default(),
            max_person_limit: default_max_person_limit(),
        }
    }
}

impl Settings {
    /// Load settings from `<file_prefix>.{toml,yaml,json,...}` (optional)
    /// overlaid with `KINMAP__*` environment variables.
    pub fn load(file_prefix: &str) -> Result<Self, KinmapError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        tracing::debug!(
            uri = %settings.neo4j.uri,
            policy = ?settings.graph.entity_policy,
            "Loaded settings"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_PERSON_LIMIT;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.neo4j.max_connections, 16);
        assert_eq!(settings.neo4j.query_timeout_ms, 5_000);
        assert_eq!(settings.graph.entity_policy, EntityPolicy::MergeOnName);
        assert!(settings.graph.max_person_limit >= DEFAULT_PERSON_LIMIT);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let settings = Settings::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(settings.neo4j.fetch_size, 256);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kinmap.toml"),
            r#"
[neo4j]
uri = "bolt://graph.internal:7687"
password = "s3cret"
query_timeout_ms = 250

[graph]
entity_policy = "always_insert"
max_person_limit = 40
"#,
        )
        .unwrap();

        let prefix = dir.path().join("kinmap");
        let settings = Settings::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(settings.neo4j.uri, "bolt://graph.internal:7687");
        assert_eq!(settings.neo4j.password, "s3cret");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.neo4j.query_timeout_ms, 250);
        assert_eq!(settings.graph.entity_policy, EntityPolicy::AlwaysInsert);
        assert_eq!(settings.graph.max_person_limit, 40);
    }

    #[test]
    fn test_unknown_policy_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("kinmap.toml"),
            "[graph]\nentity_policy = \"sometimes\"\n",
        )
        .unwrap();

        let prefix = dir.path().join("kinmap");
        let err = Settings::load(prefix.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, KinmapError::Config(_)));
    }
}
