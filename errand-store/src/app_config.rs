use errand_shared::Masked;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Masked<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_run_migrations() -> bool { true }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ERRAND__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("ERRAND").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a complete configuration from TOML text, without consulting
    /// files or the environment.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_database_fields() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://app:pw@db/errand"

            [auth]
            jwt_secret = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout_seconds, 3);
        assert!(config.database.run_migrations);
        assert_eq!(config.auth.jwt_secret.expose(), "abc");
    }

    #[test]
    fn test_debug_output_masks_secrets() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080
            [database]
            url = "postgres://app:topsecret@db/errand"
            [auth]
            jwt_secret = "signing-key"
            "#,
        )
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("signing-key"));
    }

    #[test]
    fn test_missing_section_is_an_error() {
        assert!(Config::from_toml("[server]\nport = 8080\n").is_err());
    }
}
