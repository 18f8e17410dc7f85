//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{ClientError, Result};

/// Prefix of environment overrides, e.g. `CLI_CLIENT__ID=3`
pub const ENV_PREFIX: &str = "CLI";

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with CLI_)
/// 2. Configuration file (TOML, YAML or any format `config` infers)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    load_config_with_overrides(config_path, &[])
}

/// Same as [`load_config`], with explicit values (e.g. from the command
/// line) taking precedence over every other source
pub fn load_config_with_overrides(
    config_path: Option<&str>,
    overrides: &[(&str, String)],
) -> Result<AppConfig> {
    // Pick up a .env file if present
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    for (key, value) in overrides {
        builder = builder
            .set_override(*key, value.clone())
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("lottery-client-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[client]\nid = 4\nserver_address = \"127.0.0.1:12345\"\nmax_batch_amount = 8\n\n[settings]\nlog_level = \"debug\""
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.client.id, 4);
        assert_eq!(config.client.max_batch_amount, 8);
        assert_eq!(config.client.loop_period_ms, 1000);
        assert_eq!(config.settings.log_level, "debug");
    }

    #[test]
    fn test_overrides_win() {
        let config = load_config_with_overrides(
            None,
            &[
                ("client.id", "9".to_string()),
                ("client.server_address", "localhost:4000".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(config.client.id, 9);
        assert_eq!(config.client.server_address, "localhost:4000");
    }

    #[test]
    fn test_missing_agency_id_is_an_error() {
        let result = load_config(Some("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }
}
