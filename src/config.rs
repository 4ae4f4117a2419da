use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT missing, it is required")]
    MissingPort,
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_fixtures: bool,
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v.is_empty() || v == "0" || v == "false" => Ok(false),
        Some(v) if v == "1" || v == "true" => Ok(true),
        Some(_) => Err(ConfigError::Invalid {
            name,
            value: value.unwrap_or_default(),
        }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT").ok_or(ConfigError::MissingPort)?;
        let port = parse_var("PORT", port)?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => parse_var("DATABASE_MAX_CONNECTIONS", v)?,
            None => 5,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections,
            seed_fixtures: parse_flag("SEED_FIXTURES", lookup("SEED_FIXTURES"))?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_port_is_set() {
        let cfg = config(&[("PORT", "8080")]).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.max_connections, 5);
        assert!(!cfg.seed_fixtures);
    }

    #[test]
    fn port_is_required_and_numeric() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingPort)));
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn reads_database_and_seed_settings() {
        let cfg = config(&[
            ("PORT", "3000"),
            ("HOST", "0.0.0.0"),
            ("DATABASE_URL", "postgres://localhost/taskboard"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("SEED_FIXTURES", "TRUE"),
        ])
        .unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/taskboard"));
        assert_eq!(cfg.max_connections, 12);
        assert!(cfg.seed_fixtures);

        assert!(config(&[("PORT", "3000"), ("SEED_FIXTURES", "maybe")]).is_err());
    }
}
