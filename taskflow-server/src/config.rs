/// Configuration management for the TaskFlow server
///
/// Configuration is layered: an optional `taskflow.{toml,yaml,json}` file in
/// the working directory, then `TASKFLOW_*` environment variables. A `.env`
/// file is loaded first when present.
///
/// # Environment Variables
///
/// - `TASKFLOW_LOG_FILTER`: Fallback tracing filter when `RUST_LOG` is unset
///   (default: `taskflow_server=info,taskflow_shared=info`)
/// - `TASKFLOW_SEED_DEMO_DATA`: Populate the store with demo data (default: true)
/// - `TASKFLOW_STORE__DEFAULT_ACTIVITY_LIMIT`: Activity feed size (default: 50)
/// - `TASKFLOW_STORE__DEFAULT_NOTIFICATION_LIMIT`: Notification page size (default: 50)
///
/// # Example
///
/// ```no_run
/// use taskflow_server::config::ServerConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = ServerConfig::from_env()?;
/// println!("Seeding demo data: {}", config.seed_demo_data);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use config as cfg;
use serde::{Deserialize, Serialize};
use taskflow_shared::StoreConfig;

const ENV_PREFIX: &str = "TASKFLOW";

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Whether to load the demo users, project and tasks at startup
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,

    /// Store read defaults
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_log_filter() -> String {
    "taskflow_server=info,taskflow_shared=info".to_string()
}

fn default_seed_demo_data() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            seed_demo_data: default_seed_demo_data(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value has the wrong
    /// type (e.g. a non-numeric limit).
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::load(cfg::Environment::with_prefix(ENV_PREFIX))
    }

    fn load(environment: cfg::Environment) -> anyhow::Result<Self> {
        cfg::Config::builder()
            .add_source(cfg::File::with_name("taskflow").required(false))
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::load(cfg::Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load_from(&[]).unwrap();
        assert!(config.seed_demo_data);
        assert_eq!(config.log_filter, default_log_filter());
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = load_from(&[
            ("TASKFLOW_SEED_DEMO_DATA", "false"),
            ("TASKFLOW_LOG_FILTER", "debug"),
            ("TASKFLOW_STORE__DEFAULT_ACTIVITY_LIMIT", "10"),
        ])
        .unwrap();

        assert!(!config.seed_demo_data);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.store.default_activity_limit, 10);
        assert_eq!(config.store.default_notification_limit, 50);
    }

    #[test]
    fn test_invalid_value_rejected() {
        assert!(load_from(&[("TASKFLOW_STORE__DEFAULT_ACTIVITY_LIMIT", "lots")]).is_err());
    }
}
