use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::config::{optional_env, parse_optional_env};
use crate::error::ConfigError;

/// Which database backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
    /// libSQL embedded database (default).
    #[default]
    LibSql,
    /// PostgreSQL via deadpool-postgres.
    Postgres,
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LibSql => write!(f, "libsql"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "libsql" | "sqlite" => Ok(Self::LibSql),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(format!(
                "invalid database backend '{}', expected 'libsql' or 'postgres'",
                s
            )),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Which backend to use (default: libSQL).
    pub backend: DatabaseBackend,

    // -- PostgreSQL fields --
    pub url: SecretString,
    pub pool_size: usize,

    // -- libSQL fields --
    /// Path to the local libSQL database file.
    pub libsql_path: PathBuf,
}

impl DatabaseConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let backend: DatabaseBackend = if let Some(b) = optional_env("DATABASE_BACKEND")? {
            b.parse().map_err(|e| ConfigError::InvalidValue {
                key: "DATABASE_BACKEND".to_string(),
                message: e,
            })?
        } else {
            DatabaseBackend::default()
        };

        // Only the postgres backend needs a URL.
        let url = optional_env("DATABASE_URL")?
            .or_else(|| {
                if backend == DatabaseBackend::LibSql {
                    Some("unused://libsql".to_string())
                } else {
                    None
                }
            })
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "DATABASE_URL".to_string(),
                hint: "Set DATABASE_URL or use DATABASE_BACKEND=libsql".to_string(),
            })?;

        let pool_size = parse_optional_env("DATABASE_POOL_SIZE", 10)?;
        if pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let libsql_path = optional_env("LIBSQL_PATH")?
            .map(PathBuf::from)
            .unwrap_or_else(default_libsql_path);

        Ok(Self {
            backend,
            url: SecretString::from(url),
            pool_size,
            libsql_path,
        })
    }

    /// Get the database URL (exposes the secret).
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

/// Default libSQL database path (~/.dreamer-profile/profile.db).
pub fn default_libsql_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dreamer-profile")
        .join("profile.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_default_is_libsql() {
        assert_eq!(DatabaseBackend::default(), DatabaseBackend::LibSql);
    }

    #[test]
    fn backend_parse_roundtrip() {
        for backend in [DatabaseBackend::LibSql, DatabaseBackend::Postgres] {
            let parsed: DatabaseBackend = backend.to_string().parse().expect("should parse");
            assert_eq!(parsed, backend);
        }
    }

    #[test]
    fn backend_parse_aliases_and_case() {
        assert_eq!("PG".parse::<DatabaseBackend>().unwrap(), DatabaseBackend::Postgres);
        assert_eq!("SQLite".parse::<DatabaseBackend>().unwrap(), DatabaseBackend::LibSql);
        assert!("mysql".parse::<DatabaseBackend>().is_err());
    }

    #[test]
    fn default_path_ends_with_profile_db() {
        let path = default_libsql_path();
        assert!(path.ends_with(".dreamer-profile/profile.db"));
    }
}
