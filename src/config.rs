//! Configuration system for cpu-loadgen
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (LOADGEN_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadgenConfig {
    /// HTTP listener settings
    pub server: ServerSettings,

    /// Load generation limits and defaults
    pub load: LoadSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Maximum load-generating requests running at once (0 = unlimited)
    pub max_concurrent_loads: usize,
}

/// Which behaviour `/fib/{param}` exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FibMode {
    /// `param` is minutes; compute batches until the deadline
    #[default]
    Duration,
    /// `param` is a ceiling; return the full sequence up to it
    Bounded,
}

impl FromStr for FibMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duration" => Ok(FibMode::Duration),
            "bounded" => Ok(FibMode::Bounded),
            other => Err(format!("unknown fib mode '{}'", other)),
        }
    }
}

impl fmt::Display for FibMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FibMode::Duration => write!(f, "duration"),
            FibMode::Bounded => write!(f, "bounded"),
        }
    }
}

/// Load generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Duration used by `/heavy` when none (or garbage) is given
    pub default_duration_secs: u64,

    /// Upper clamp for `/heavy` duration
    pub max_duration_secs: u64,

    /// Upper clamp for `/heavy` workers
    pub max_heavy_workers: usize,

    /// Upper clamp for `/fib/{minutes}` workers
    pub max_fib_workers: usize,

    /// Fibonacci numbers computed before a worker restarts from 0, 1
    pub fib_batch_size: usize,

    /// Largest accepted target for the bounded Fibonacci endpoint
    pub max_fib_target: u64,

    /// Largest accepted minutes for the duration Fibonacci endpoint (0 = unlimited)
    pub max_fib_minutes: u64,

    /// Fibonacci endpoint behaviour
    pub fib_mode: FibMode,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_concurrent_loads: 0,
        }
    }
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            default_duration_secs: 10,
            max_duration_secs: 60,
            max_heavy_workers: 10,
            max_fib_workers: 20,
            fib_batch_size: 1000,
            max_fib_target: 10_000,
            max_fib_minutes: 0,
            fib_mode: FibMode::Duration,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl LoadgenConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| {
                Error::config_parse(format!("{}: {}", path.display(), e.message()), e)
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            Some(PathBuf::from("cpu-loadgen.toml")),
            dirs::config_dir().map(|p| p.join("cpu-loadgen").join("config.toml")),
            dirs::home_dir().map(|p| p.join(".cpu-loadgen").join("config.toml")),
            Some(PathBuf::from("/etc/cpu-loadgen/config.toml")),
        ];

        for path in search_paths.iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides; unparseable values are ignored
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LOADGEN_HOST") {
            self.server.host = val;
        }
        override_parsed("LOADGEN_PORT", &mut self.server.port);
        override_parsed("LOADGEN_MAX_CONCURRENT_LOADS", &mut self.server.max_concurrent_loads);

        override_parsed("LOADGEN_FIB_MODE", &mut self.load.fib_mode);
        override_parsed("LOADGEN_MAX_DURATION_SECS", &mut self.load.max_duration_secs);
        override_parsed("LOADGEN_MAX_HEAVY_WORKERS", &mut self.load.max_heavy_workers);
        override_parsed("LOADGEN_MAX_FIB_WORKERS", &mut self.load.max_fib_workers);
        override_parsed("LOADGEN_MAX_FIB_MINUTES", &mut self.load.max_fib_minutes);

        if let Ok(val) = std::env::var("LOADGEN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("LOADGEN_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("LOADGEN_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and environment variables in paths
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        let load = &self.load;
        if load.max_duration_secs == 0 {
            return Err(Error::config_field_invalid(
                "load.max_duration_secs",
                "max_duration_secs must be at least 1",
            ));
        }
        if load.default_duration_secs == 0 || load.default_duration_secs > load.max_duration_secs {
            return Err(Error::config_field_invalid(
                "load.default_duration_secs",
                format!(
                    "default_duration_secs must be between 1 and {}",
                    load.max_duration_secs
                ),
            ));
        }
        if load.max_heavy_workers == 0 || load.max_fib_workers == 0 {
            return Err(Error::config_field_invalid(
                "load.max_heavy_workers",
                "worker caps must be at least 1",
            ));
        }
        if load.fib_batch_size == 0 {
            return Err(Error::config_field_invalid(
                "load.fib_batch_size",
                "fib_batch_size must be at least 1",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        raw.parse().map_err(|_| {
            Error::config_field_invalid("server.host", format!("Invalid bind address '{}'", raw))
        })
    }
}

/// Replace `target` with the parsed value of env var `key`, if present and valid
fn override_parsed<T: FromStr>(key: &str, target: &mut T) {
    if let Some(parsed) = std::env::var(key).ok().and_then(|val| val.parse().ok()) {
        *target = parsed;
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cpu-loadgen")
                .join("config.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Default configuration written by `config init`
const DEFAULT_CONFIG: &str = r#"# cpu-loadgen configuration

[server]
# Address and port to listen on
host = "0.0.0.0"
port = 8080

# Maximum load-generating requests running at once (0 = unlimited).
# Requests over the limit receive 503 immediately.
max_concurrent_loads = 0

[load]
# /heavy duration when none is given, and its upper clamp (seconds)
default_duration_secs = 10
max_duration_secs = 60

# Upper clamps for ?workers= (default is the host CPU count)
max_heavy_workers = 10
max_fib_workers = 20

# Fibonacci numbers computed before a worker restarts from 0, 1
fib_batch_size = 1000

# Largest target accepted in bounded mode
max_fib_target = 10000

# Largest minutes accepted in duration mode (0 = unlimited)
max_fib_minutes = 0

# /fib/{param} behaviour: "duration" (param = minutes) or "bounded" (param = ceiling)
fib_mode = "duration"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "/var/log/cpu-loadgen/loadgen.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = LoadgenConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.load.default_duration_secs, 10);
        assert_eq!(config.load.max_heavy_workers, 10);
        assert_eq!(config.load.max_fib_workers, 20);
        assert_eq!(config.load.fib_mode, FibMode::Duration);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_override() {
        env::set_var("LOADGEN_PORT", "9090");
        env::set_var("LOADGEN_FIB_MODE", "bounded");
        env::set_var("LOADGEN_MAX_HEAVY_WORKERS", "not-a-number");

        let mut config = LoadgenConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.load.fib_mode, FibMode::Bounded);
        assert_eq!(config.load.max_heavy_workers, 10);

        env::remove_var("LOADGEN_PORT");
        env::remove_var("LOADGEN_FIB_MODE");
        env::remove_var("LOADGEN_MAX_HEAVY_WORKERS");
    }

    #[test]
    fn test_validation_invalid_host() {
        let mut config = LoadgenConfig::default();
        config.server.host = "not a host".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_default_duration_above_max() {
        let mut config = LoadgenConfig::default();
        config.load.default_duration_secs = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_worker_cap() {
        let mut config = LoadgenConfig::default();
        config.load.max_fib_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = LoadgenConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(LoadgenConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_config_template_parses() {
        let parsed: LoadgenConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.load.fib_mode, FibMode::Duration);
    }

    #[test]
    fn test_fib_mode_from_str() {
        assert_eq!("Bounded".parse::<FibMode>().unwrap(), FibMode::Bounded);
        assert_eq!(" duration ".parse::<FibMode>().unwrap(), FibMode::Duration);
        assert!("sideways".parse::<FibMode>().is_err());
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[server]
host = "127.0.0.1"
port = 3000
max_concurrent_loads = 4

[load]
max_duration_secs = 30
fib_mode = "bounded"

[logging]
level = "debug"
"#;

        let config: LoadgenConfig = toml::from_str(config_str).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_concurrent_loads, 4);
        assert_eq!(config.load.max_duration_secs, 30);
        assert_eq!(config.load.max_fib_target, 10_000);
        assert_eq!(config.load.fib_mode, FibMode::Bounded);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let path_str = path.to_str().unwrap();

        let written = init_config(Some(path_str), false).unwrap();
        assert_eq!(written, path);
        assert!(init_config(Some(path_str), false).is_err());
        assert!(init_config(Some(path_str), true).is_ok());
    }
}
