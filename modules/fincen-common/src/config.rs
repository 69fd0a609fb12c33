use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Connection credentials read from the local auth file.
///
/// The file is a JSON object with two string fields: `user` and `pd`.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pd: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pd", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read and parse the credential file. Absence or malformed JSON is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::CredentialsUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::CredentialsMalformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Application configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_auth_path: PathBuf,
    pub neo4j_max_connections: usize,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Country vector view
    pub neighbor_limit: i64,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let neo4j_auth_path = lookup("NEO4J_AUTH_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingVar("NEO4J_AUTH_PATH"))?;

        Ok(Self {
            neo4j_uri: lookup("NEO4J_URI")
                .unwrap_or_else(|| "neo4j://localhost:7687".to_string()),
            neo4j_auth_path,
            neo4j_max_connections: parse_or(&lookup, "NEO4J_MAX_CONNECTIONS", 1)?,
            web_host: lookup("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parse_or(&lookup, "WEB_PORT", 3000)?,
            neighbor_limit: parse_or(&lookup, "NEIGHBOR_LIMIT", 15)?,
        })
    }

    /// Load the credentials this config points at.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::load(&self.neo4j_auth_path)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  NEO4J_URI: {}", self.neo4j_uri);
        tracing::info!("  NEO4J_AUTH_PATH: {}", self.neo4j_auth_path.display());
        tracing::info!("  NEO4J_MAX_CONNECTIONS: {}", self.neo4j_max_connections);
        tracing::info!("  WEB: {}:{}", self.web_host, self.web_port);
        tracing::info!("  NEIGHBOR_LIMIT: {}", self.neighbor_limit);
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_auth_path_set() {
        let config = Config::from_lookup(lookup_from(&[("NEO4J_AUTH_PATH", "/tmp/auth.json")]))
            .unwrap();
        assert_eq!(config.neo4j_uri, "neo4j://localhost:7687");
        assert_eq!(config.neo4j_max_connections, 1);
        assert_eq!(config.web_port, 3000);
        assert_eq!(config.neighbor_limit, 15);
    }

    #[test]
    fn missing_auth_path_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("NEO4J_AUTH_PATH")));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("NEO4J_AUTH_PATH", "/tmp/auth.json"),
            ("WEB_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { var: "WEB_PORT", .. }));
    }

    #[test]
    fn credentials_parse_user_and_pd() {
        let creds =
            Credentials::parse(r#"{"user": "neo4j", "pd": "secret"}"#, Path::new("auth.json"))
                .unwrap();
        assert_eq!(creds.user, "neo4j");
        assert_eq!(creds.pd, "secret");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn credentials_missing_field_is_malformed() {
        let err = Credentials::parse(r#"{"user": "neo4j"}"#, Path::new("auth.json")).unwrap_err();
        assert!(matches!(err, ConfigError::CredentialsMalformed { .. }));
    }

    #[test]
    fn missing_credential_file_is_unreadable() {
        let err = Credentials::load(Path::new("/nonexistent/fincen/auth.json")).unwrap_err();
        assert!(matches!(err, ConfigError::CredentialsUnreadable { .. }));
    }
}
