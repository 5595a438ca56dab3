//! Configuration loader for xmpp-notify
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
pub const CONFIG_DIR_ENV: &str = "XMPP_NOTIFY_CONFIG_DIR";

/// Environment variable for specific configuration file
pub const CONFIG_FILE_ENV: &str = "XMPP_NOTIFY_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "XMPP_NOTIFY";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Where the loader reads files from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// `default.toml`, `{environment}.toml` and `local.toml` from a directory
    Layered(PathBuf),
    /// A single file, skipping the layered lookup
    SingleFile(PathBuf),
}

/// Configuration loader that handles layered configuration loading
///
/// The loader supports the following configuration sources (in order of priority):
/// 1. `default.toml` - Base default configuration (required)
/// 2. `{environment}.toml` - Environment-specific configuration (optional)
/// 3. `local.toml` - Local overrides (optional)
/// 4. `XMPP_NOTIFY_*` environment variables (highest priority)
#[derive(Debug)]
pub struct ConfigLoader {
    source: Source,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if both `XMPP_NOTIFY_CONFIG_DIR` and `XMPP_NOTIFY_CONFIG_FILE`
    /// are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok();

        let source = match (config_dir, config_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(format!(
                    "{} and {} cannot both be set. Use {} for layered configuration or \
                     {} for a single configuration file.",
                    CONFIG_DIR_ENV, CONFIG_FILE_ENV, CONFIG_DIR_ENV, CONFIG_FILE_ENV
                )));
            }
            (None, Some(file)) => Source::SingleFile(PathBuf::from(file)),
            (Some(dir), None) => Source::Layered(PathBuf::from(dir)),
            (None, None) => Source::Layered(PathBuf::from(DEFAULT_CONFIG_DIR)),
        };

        Ok(Self {
            source,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Create a loader that reads exactly one file, plus environment overrides
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::SingleFile(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Override the environment used to pick the overlay file
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Get the current application environment
    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load and validate configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `default.toml` (or the single configured file) is not found
    /// - Configuration parsing fails
    /// - Configuration validation fails, e.g. a credential key is missing
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings = self.load_unvalidated()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration without running validation
    pub fn load_unvalidated(&self) -> Result<Settings, ConfigError> {
        self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.source {
            Source::SingleFile(path) => Self::add_file_source(builder, path, true)?,
            Source::Layered(dir) => {
                let builder = Self::add_file_source(builder, &dir.join("default.toml"), true)?;
                let builder = Self::add_file_source(
                    builder,
                    &dir.join(self.environment.overlay_file_name()),
                    false,
                )?;
                Self::add_file_source(builder, &dir.join("local.toml"), false)?
            }
        };

        // XMPP_NOTIFY_XMPP__PASSWORD -> xmpp.password
        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Environment variables are process-global; tests touching them run one at a time
    pub(crate) static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        CONFIG_DIR_ENV,
        CONFIG_FILE_ENV,
        AppEnvironment::ENV_VAR,
        "XMPP_NOTIFY_XMPP__SENDER",
        "XMPP_NOTIFY_XMPP__PASSWORD",
        "XMPP_NOTIFY_XMPP__RECIPIENT",
    ];

    const DEFAULT_TOML: &str = r#"
[application]
name = "test-notify"

[xmpp]
resource = "home-assistant"
connect_timeout = 30

[logger]
level = "info"

[logger.console]
enabled = true
colored = false
"#;

    const CREDENTIALS_TOML: &str = r#"
[xmpp]
sender = "bot@example.com"
password = "secret"
recipient = "alice@example.com"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Sets environment variables for one test and restores them on drop
    pub(crate) struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        /// Starts from a clean slate for every variable the loader reads
        pub(crate) fn clean() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            for var in ENV_VARS {
                guard.remove(var);
            }
            guard
        }

        pub(crate) fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_loader_new_default() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.source, Source::Layered(PathBuf::from("config")));
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_with_config_file() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        env.set(CONFIG_FILE_ENV, "/path/to/notify.toml");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(
            loader.source,
            Source::SingleFile(PathBuf::from("/path/to/notify.toml"))
        );
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(CONFIG_FILE_ENV, "/path/to/notify.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains(CONFIG_DIR_ENV));
                assert!(msg.contains(CONFIG_FILE_ENV));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        match ConfigLoader::new().unwrap().load() {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_without_credentials_fails_validation() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        let loader = ConfigLoader::new().unwrap();
        let err = loader.load().unwrap_err();
        assert_eq!(err.field(), Some("xmpp.sender"));

        // Still parseable when validation is skipped
        let settings = loader.load_unvalidated().unwrap();
        assert_eq!(settings.application.name, "test-notify");
    }

    #[test]
    fn test_load_with_local_credentials() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("local.toml", CREDENTIALS_TOML),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load");
        assert_eq!(settings.xmpp.sender.as_deref(), Some("bot@example.com"));
        assert_eq!(settings.xmpp.recipient.as_deref(), Some("alice@example.com"));
        assert_eq!(settings.xmpp.connect_timeout, 30);
    }

    #[test]
    fn test_load_full_precedence_chain() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();

        let production = r#"
[application]
name = "prod-notify"

[xmpp]
connect_timeout = 20
recipient = "oncall@example.com"
"#;
        let local = r#"
[xmpp]
sender = "bot@example.com"
password = "from-file"
connect_timeout = 10
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("production.toml", production),
            ("local.toml", local),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set(AppEnvironment::ENV_VAR, "prod");
        env.set("XMPP_NOTIFY_XMPP__PASSWORD", "from-env");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load");

        // Environment variable has highest priority
        assert_eq!(settings.xmpp.password.as_deref(), Some("from-env"));
        // local.toml overrides production.toml
        assert_eq!(settings.xmpp.connect_timeout, 10);
        // production.toml overrides default.toml
        assert_eq!(settings.application.name, "prod-notify");
        assert_eq!(settings.xmpp.recipient.as_deref(), Some("oncall@example.com"));
        // default.toml provides base values
        assert_eq!(settings.xmpp.resource, "home-assistant");
    }

    #[test]
    fn test_load_single_file_mode() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[("single.toml", CREDENTIALS_TOML)]);

        let settings = ConfigLoader::from_file(temp_dir.path().join("single.toml"))
            .load()
            .expect("Should load settings");
        assert_eq!(settings.xmpp.password.as_deref(), Some("secret"));
        assert_eq!(settings.logger.level, "info");
    }

    #[test]
    fn test_optional_overlays_not_required() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set("XMPP_NOTIFY_XMPP__SENDER", "bot@example.com");
        env.set("XMPP_NOTIFY_XMPP__PASSWORD", "secret");
        env.set("XMPP_NOTIFY_XMPP__RECIPIENT", "alice@example.com");

        let settings = ConfigLoader::new()
            .unwrap()
            .with_environment(AppEnvironment::Staging)
            .load()
            .expect("staging.toml and local.toml are optional");
        assert_eq!(settings.xmpp.sender.as_deref(), Some("bot@example.com"));
    }
}
