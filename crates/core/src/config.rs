//! Layered runtime configuration.
//!
//! Each source (config file, `CATALOG_*` environment, programmatic overrides) is
//! read into a [`ConfigPatch`] and merged over the defaults in that order, so a
//! later layer only replaces the fields it actually sets.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://catalog.db?mode=rwc".to_string(),
            max_connections: 5,
            timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Settings for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Self { url: "sqlite::memory:".to_string(), ..Self::default() }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080, graceful_shutdown_secs: 15 }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

/// Which product repository variant backs the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub storage_backend: Option<StorageBackend>,
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported storage backend `{other}` (expected memory|sqlite)"
            ))),
        }
    }
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Environment variables that can set `key_path`, in lookup order.
pub fn env_keys(key_path: &str) -> &'static [&'static str] {
    match key_path {
        "storage.backend" => &["CATALOG_STORAGE_BACKEND"],
        "database.url" => &["CATALOG_DATABASE_URL"],
        "database.max_connections" => &["CATALOG_DATABASE_MAX_CONNECTIONS"],
        "database.timeout_secs" => &["CATALOG_DATABASE_TIMEOUT_SECS"],
        "server.bind_address" => &["CATALOG_SERVER_BIND_ADDRESS"],
        "server.port" => &["CATALOG_SERVER_PORT"],
        "server.graceful_shutdown_secs" => &["CATALOG_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        "logging.level" => &["CATALOG_LOGGING_LEVEL", "CATALOG_LOG_LEVEL"],
        "logging.format" => &["CATALOG_LOGGING_FORMAT", "CATALOG_LOG_FORMAT"],
        _ => &[],
    }
}

/// The first non-blank environment value that sets `key_path`, with the variable it came from.
/// Blank values count as unset.
pub fn env_override(key_path: &str) -> Option<(&'static str, String)> {
    env_keys(key_path).iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

fn env_parsed<T: FromStr>(key_path: &str) -> Result<Option<T>, ConfigError> {
    env_override(key_path)
        .map(|(key, value)| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value })
        })
        .transpose()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.merge(read_patch(&path)?),
            None if options.require_file => {
                return Err(ConfigError::MissingConfigFile(
                    options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
                ));
            }
            None => {}
        }

        config.merge(ConfigPatch::from_env()?);
        config.merge(ConfigPatch::from(options.overrides));
        config.validate()?;

        Ok(config)
    }

    fn merge(&mut self, patch: ConfigPatch) {
        let storage = patch.storage.unwrap_or_default();
        replace(&mut self.storage.backend, storage.backend);

        let database = patch.database.unwrap_or_default();
        replace(&mut self.database.url, database.url);
        replace(&mut self.database.max_connections, database.max_connections);
        replace(&mut self.database.timeout_secs, database.timeout_secs);

        let server = patch.server.unwrap_or_default();
        replace(&mut self.server.bind_address, server.bind_address);
        replace(&mut self.server.port, server.port);
        replace(&mut self.server.graceful_shutdown_secs, server.graceful_shutdown_secs);

        let logging = patch.logging.unwrap_or_default();
        replace(&mut self.logging.level, logging.level);
        replace(&mut self.logging.format, logging.format);
    }

    /// Database settings are checked only when the sqlite backend will use them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uses_database = self.storage.backend == StorageBackend::Sqlite;
        let database = &self.database;
        let level = self.logging.level.trim().to_ascii_lowercase();

        let failures = [
            (
                uses_database && !is_sqlite_url(&database.url),
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
            ),
            (
                uses_database && database.max_connections == 0,
                "database.max_connections must be greater than zero",
            ),
            (
                uses_database && !(1..=300).contains(&database.timeout_secs),
                "database.timeout_secs must be in range 1..=300",
            ),
            (self.server.bind_address.trim().is_empty(), "server.bind_address must not be empty"),
            (self.server.port == 0, "server.port must be greater than zero"),
            (
                self.server.graceful_shutdown_secs == 0,
                "server.graceful_shutdown_secs must be greater than zero",
            ),
            (
                !LOG_LEVELS.contains(&level.as_str()),
                "logging.level must be one of trace|debug|info|warn|error",
            ),
        ];

        match failures.into_iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Validation(message.to_string())),
            None => Ok(()),
        }
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn is_sqlite_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:"
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str(&interpolate_env_vars(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references from the process environment.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &reference[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &reference[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// One configuration layer; `None` leaves the underlying value untouched.
#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    backend: Option<StorageBackend>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ConfigPatch {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            storage: Some(StoragePatch { backend: env_parsed("storage.backend")? }),
            database: Some(DatabasePatch {
                url: env_override("database.url").map(|(_, value)| value),
                max_connections: env_parsed("database.max_connections")?,
                timeout_secs: env_parsed("database.timeout_secs")?,
            }),
            server: Some(ServerPatch {
                bind_address: env_override("server.bind_address").map(|(_, value)| value),
                port: env_parsed("server.port")?,
                graceful_shutdown_secs: env_parsed("server.graceful_shutdown_secs")?,
            }),
            logging: Some(LoggingPatch {
                level: env_override("logging.level").map(|(_, value)| value),
                format: env_parsed("logging.format")?,
            }),
        })
    }
}

impl From<ConfigOverrides> for ConfigPatch {
    fn from(overrides: ConfigOverrides) -> Self {
        Self {
            storage: Some(StoragePatch { backend: overrides.storage_backend }),
            database: Some(DatabasePatch {
                url: overrides.database_url,
                ..DatabasePatch::default()
            }),
            server: Some(ServerPatch {
                bind_address: overrides.bind_address,
                port: overrides.port,
                ..ServerPatch::default()
            }),
            logging: Some(LoggingPatch { level: overrides.log_level, format: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{
        env_override, interpolate_env_vars, AppConfig, ConfigError, ConfigOverrides, LoadOptions,
        LogFormat, StorageBackend,
    };

    const MANAGED_VARS: &[&str] = &[
        "CATALOG_STORAGE_BACKEND",
        "CATALOG_DATABASE_URL",
        "CATALOG_DATABASE_MAX_CONNECTIONS",
        "CATALOG_DATABASE_TIMEOUT_SECS",
        "CATALOG_SERVER_BIND_ADDRESS",
        "CATALOG_SERVER_PORT",
        "CATALOG_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CATALOG_LOGGING_LEVEL",
        "CATALOG_LOGGING_FORMAT",
        "CATALOG_LOG_LEVEL",
        "CATALOG_LOG_FORMAT",
        "TEST_CATALOG_DB_PATH",
    ];

    /// Runs `test_fn` with only `vars` set among the catalog variables.
    fn with_vars<R>(vars: &[(&str, &str)], test_fn: impl FnOnce() -> R) -> R {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for var in MANAGED_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let result = test_fn();

        for var in MANAGED_VARS {
            env::remove_var(var);
        }
        result
    }

    fn load_file(contents: &str, overrides: ConfigOverrides) -> Result<AppConfig, ConfigError> {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, contents).expect("write config file");

        let options = LoadOptions { config_path: Some(path), overrides, ..LoadOptions::default() };
        AppConfig::load(options)
    }

    #[test]
    fn defaults_select_memory_storage() {
        let config = with_vars(&[], || AppConfig::load(LoadOptions::default())).expect("load");

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_load_supports_env_interpolation() {
        let config = with_vars(&[("TEST_CATALOG_DB_PATH", "sqlite://interpolated.db")], || {
            load_file(
                "[storage]\nbackend = \"sqlite\"\n[database]\nurl = \"${TEST_CATALOG_DB_PATH}\"\n",
                ConfigOverrides::default(),
            )
        })
        .expect("load");

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.database.url, "sqlite://interpolated.db");
    }

    #[test]
    fn later_layers_replace_only_the_fields_they_set() {
        let file = r#"
[storage]
backend = "sqlite"

[database]
url = "sqlite://from-file.db"

[server]
port = 7070
bind_address = "0.0.0.0"

[logging]
level = "warn"
"#;
        let overrides = ConfigOverrides {
            database_url: Some("sqlite://from-override.db".to_string()),
            log_level: Some("debug".to_string()),
            ..ConfigOverrides::default()
        };

        let config = with_vars(
            &[("CATALOG_DATABASE_URL", "sqlite://from-env.db"), ("CATALOG_SERVER_PORT", "9090")],
            || load_file(file, overrides),
        )
        .expect("load");

        assert_eq!(config.database.url, "sqlite://from-override.db");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn logging_env_aliases_are_supported() {
        let config = with_vars(
            &[("CATALOG_LOG_LEVEL", "warn"), ("CATALOG_LOG_FORMAT", "json")],
            || AppConfig::load(LoadOptions::default()),
        )
        .expect("load");

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn blank_env_values_count_as_unset() {
        let (config, source) = with_vars(&[("CATALOG_SERVER_PORT", "  ")], || {
            (AppConfig::load(LoadOptions::default()), env_override("server.port"))
        });

        assert_eq!(config.expect("load").server.port, 8080);
        assert_eq!(source, None);
    }

    #[test]
    fn sqlite_backend_rejects_non_sqlite_url() {
        let result = with_vars(
            &[
                ("CATALOG_STORAGE_BACKEND", "sqlite"),
                ("CATALOG_DATABASE_URL", "postgres://localhost/catalog"),
            ],
            || AppConfig::load(LoadOptions::default()),
        );

        assert!(matches!(
            result,
            Err(ConfigError::Validation(ref message)) if message.contains("database.url")
        ));
    }

    #[test]
    fn memory_backend_ignores_database_settings() {
        let result = with_vars(&[("CATALOG_DATABASE_URL", "postgres://localhost/catalog")], || {
            AppConfig::load(LoadOptions::default())
        });

        assert!(result.is_ok(), "memory backend should not validate database: {result:?}");
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() {
        let result = with_vars(&[("CATALOG_SERVER_PORT", "eighty")], || {
            AppConfig::load(LoadOptions::default())
        });

        match result {
            Err(ConfigError::InvalidEnvOverride { key, value }) => {
                assert_eq!(key, "CATALOG_SERVER_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected invalid override failure, got {other:?}"),
        }
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let result = with_vars(&[("CATALOG_LOGGING_LEVEL", "verbose")], || {
            AppConfig::load(LoadOptions::default())
        });

        assert!(matches!(
            result,
            Err(ConfigError::Validation(ref message)) if message.contains("logging.level")
        ));
    }

    #[test]
    fn interpolation_reports_unterminated_reference() {
        let result = interpolate_env_vars("url = \"${CATALOG_DB");

        assert!(matches!(result, Err(ConfigError::UnterminatedInterpolation)));
    }

    #[test]
    fn required_file_missing_fails() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("does-not-exist/catalog.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }
}
