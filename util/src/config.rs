//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete grader configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub experiment_storage_root: String,
    pub python_bin: String,
    pub grader_id: i64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every value has a default so the grader can run from a bare checkout;
    /// malformed numeric values fall back to their defaults as well.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/grader.db".into()),
            experiment_storage_root: env::var("EXPERIMENT_STORAGE_ROOT")
                .unwrap_or_else(|_| "data/experiments".into()),
            python_bin: env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".into()),
            grader_id: env::var("GRADER_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_experiment_storage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.experiment_storage_root = value.into());
    }

    pub fn set_python_bin(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.python_bin = value.into());
    }

    pub fn set_grader_id(value: i64) {
        AppConfig::set_field(|cfg| cfg.grader_id = value);
    }
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn storage_root() -> String {
    AppConfig::global().experiment_storage_root.clone()
}

pub fn python_bin() -> String {
    AppConfig::global().python_bin.clone()
}

pub fn grader_id() -> i64 {
    AppConfig::global().grader_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_loaded_values() {
        AppConfig::set_python_bin("/opt/python/bin/python3");
        AppConfig::set_grader_id(42);

        assert_eq!(python_bin(), "/opt/python/bin/python3");
        assert_eq!(grader_id(), 42);

        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn malformed_grader_id_falls_back_to_zero() {
        unsafe {
            env::set_var("GRADER_ID", "not-a-number");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.grader_id, 0);
        unsafe {
            env::remove_var("GRADER_ID");
        }
    }
}
