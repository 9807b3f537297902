use std::env;
use std::path::PathBuf;

/// Store configuration.
///
/// Reads from the `COSTBOOK_DB_PATH` environment variable, falling back to
/// `costbook.db` in the working directory when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl DbConfig {
    /// The default database file used when no environment variable is set.
    pub const DEFAULT_PATH: &str = "costbook.db";

    /// Build a config from the environment.
    ///
    /// Priority: `COSTBOOK_DB_PATH` env var, then the compile-time default.
    pub fn from_env() -> Self {
        let db_path = env::var("COSTBOOK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_PATH));
        Self { db_path }
    }

    /// Build a config from an explicit path (useful for tests and CLI flags).
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let config = DbConfig::new("/tmp/estimates.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/estimates.db"));
    }
}
