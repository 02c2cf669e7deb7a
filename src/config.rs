//! Connection configuration.
//!
//! A connection is described the way a JDBC-style helper is: a URL prefix, a
//! database name appended to it, and credentials. The URL must use the
//! `sqlite:` scheme; `sqlite::memory:` selects an in-memory database.
//!
//! ```
//! use sqlite_operations::config::{ConnectionConfig, Target};
//!
//! let config = ConnectionConfig::new("sqlite:/var/lib/app/", "shop", "root", "secret");
//! assert_eq!(
//!     config.target().unwrap(),
//!     Target::File("/var/lib/app/shop".into())
//! );
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OperationsError, Result};
use crate::sql::validate_identifier;

const SCHEME: &str = "sqlite:";
const MEMORY: &str = ":memory:";

/// Default busy timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_true() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Settings used to open the helper's connection.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// URL prefix, e.g. `sqlite:/var/lib/app/` or `sqlite::memory:`
    pub url: String,
    /// Database name appended to the URL prefix
    pub database: String,
    #[serde(default)]
    pub user: String,
    /// Accepted for interface parity; SQLite does not authenticate.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Whether batched inserts are allowed on this connection
    #[serde(default = "default_true")]
    pub batch_updates: bool,
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

/// Where the connection points after resolving URL + database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Memory,
    File(PathBuf),
}

impl ConnectionConfig {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            batch_updates: true,
            foreign_keys: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// In-memory configuration with the given database label.
    pub fn memory(database: impl Into<String>) -> Self {
        Self::new(format!("{}{}", SCHEME, MEMORY), database, "", "")
    }

    /// Parse a JSON document; missing optional fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ConnectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_batch_updates(mut self, enabled: bool) -> Self {
        self.batch_updates = enabled;
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    /// Same settings pointed at another database.
    pub fn for_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.target().map(|_| ())
    }

    /// Resolve URL prefix + database name into a connection target.
    pub fn target(&self) -> Result<Target> {
        let rest = self.url.strip_prefix(SCHEME).ok_or_else(|| {
            OperationsError::InvalidConfig(format!(
                "unsupported connection url {:?}, expected the {} scheme",
                self.url, SCHEME
            ))
        })?;
        let database = validate_identifier(&self.database)?;
        if database.contains(|c: char| c == '/' || c == '\\') {
            return Err(OperationsError::InvalidIdentifier(self.database.clone()));
        }

        let prefix = rest.strip_prefix("//").unwrap_or(rest);
        if prefix == MEMORY {
            return Ok(Target::Memory);
        }
        Ok(Target::File(PathBuf::from(format!("{}{}", prefix, database))))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("batch_updates", &self.batch_updates)
            .field("foreign_keys", &self.foreign_keys)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_concatenates_url_and_database() {
        let config = ConnectionConfig::new("sqlite:data/", "bd_prueba", "root", "root");
        assert_eq!(config.target().unwrap(), Target::File("data/bd_prueba".into()));

        let config = ConnectionConfig::new("sqlite:///tmp/", "shop", "", "");
        assert_eq!(config.target().unwrap(), Target::File("/tmp/shop".into()));
    }

    #[test]
    fn test_memory_target() {
        assert_eq!(ConnectionConfig::memory("scratch").target().unwrap(), Target::Memory);
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        let config = ConnectionConfig::new("jdbc:mysql://127.0.0.1:3306/", "bd", "root", "root");
        assert!(matches!(
            config.target(),
            Err(OperationsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_path_like_database_names() {
        let config = ConnectionConfig::new("sqlite:/tmp/", "../etc", "", "");
        assert!(matches!(
            config.target(),
            Err(OperationsError::InvalidIdentifier(_))
        ));
        let config = ConnectionConfig::new("sqlite:/tmp/", "  ", "", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = ConnectionConfig::from_json(
            r#"{"url": "sqlite::memory:", "database": "shop", "password": "hunter2"}"#,
        )
        .unwrap();
        assert!(config.batch_updates);
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.password, "hunter2");
    }

    #[test]
    fn test_password_is_never_exposed() {
        let config = ConnectionConfig::new("sqlite::memory:", "shop", "root", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
    }
}
