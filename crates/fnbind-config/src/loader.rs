//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML or JSON file
//! 3. Environment variables named `<PREFIX>__<SECTION>__<KEY>`

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, FnbindConfig};

/// The default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "FNBIND";

/// Text formats a configuration can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> Result<FnbindConfig, ConfigError> {
        match self {
            Self::Toml => Ok(toml::from_str(content)?),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use fnbind_config::ConfigLoader;
///
/// # fn main() -> Result<(), fnbind_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("fnbind.toml")?
///     .with_env_prefix("FNBIND")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: FnbindConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = FnbindConfig::default();
        self
    }

    /// Resets to the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = FnbindConfig::development();
        self
    }

    /// Loads a configuration file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, has an unknown extension,
    /// or does not parse.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = format.parse(&content)?;
        self.file_loaded = true;
        Ok(self)
    }

    /// Loads a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string.
    ///
    /// # Errors
    ///
    /// Fails if the content does not parse.
    pub fn with_string(mut self, content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        self.config = format.parse(content)?;
        self.file_loaded = true;
        Ok(self)
    }

    /// Enables environment overrides under `prefix` (uppercased).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into().to_uppercase());
        self
    }

    /// Loads a `.env` file from the working directory into the process
    /// environment, if one exists.
    ///
    /// # Errors
    ///
    /// Fails if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Returns `true` if a file or string layer was applied.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails if an environment variable does not parse or the result does
    /// not validate.
    pub fn load(self) -> Result<FnbindConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Fails if an environment variable does not parse.
    pub fn load_unvalidated(mut self) -> Result<FnbindConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            apply_env_vars(&mut self.config, &prefix, env::vars())?;
        }
        Ok(self.config)
    }
}

/// Applies every `<prefix>__...` variable in `vars` to `config`.
///
/// Variables under the prefix that name no known key are ignored.
fn apply_env_vars(
    config: &mut FnbindConfig,
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<(), ConfigError> {
    let marker = format!("{prefix}__");
    for (key, value) in vars {
        if let Some(rest) = key.strip_prefix(&marker) {
            apply_env_var(config, &key, rest, &value)?;
        }
    }
    Ok(())
}

fn apply_env_var(
    config: &mut FnbindConfig,
    key: &str,
    rest: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let parts: Vec<&str> = rest.split("__").collect();

    match parts.as_slice() {
        ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
        ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
            config.server.shutdown_timeout_secs = parse_int(key, value)?;
        }
        ["SERVER", "REQUEST_TIMEOUT_MS"] => {
            config.server.request_timeout_ms = parse_int(key, value)?;
        }
        ["SERVER", "ROUTE_METRICS"] => config.server.route_metrics = parse_flag(key, value)?,

        ["DECODER", "MAX_BODY_BYTES"] => config.decoder.max_body_bytes = parse_int(key, value)?,
        ["DECODER", "DISALLOW_UNKNOWN_FIELDS"] => {
            config.decoder.disallow_unknown_fields = parse_flag(key, value)?;
        }

        ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
        ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
        ["LOGGING", "FORMAT"] => {
            config.logging.format = match value.to_lowercase().as_str() {
                "json" => crate::LogFormat::Json,
                "pretty" => crate::LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::env_parse_error(
                        key,
                        "expected \"json\" or \"pretty\"",
                    ))
                }
            };
        }

        ["METRICS", "ENABLED"] => config.metrics.enabled = parse_flag(key, value)?,
        ["METRICS", "ADDR"] => config.metrics.addr = value.to_string(),

        _ => {}
    }

    Ok(())
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:9000\"\n\n[decoder]\nmax_body_bytes = 2048"
        )
        .unwrap();

        let loader = ConfigLoader::new().with_file(file.path()).unwrap();
        assert!(loader.file_loaded());

        let config = loader.load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.decoder.max_body_bytes, 2048);
        assert!(config.decoder.disallow_unknown_fields);
    }

    #[test]
    fn test_loader_with_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"logging": {{"format": "pretty"}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_missing_file() {
        let err = ConfigLoader::new().with_file("/nonexistent/fnbind.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_loader_optional_missing_file() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/fnbind.toml")
            .unwrap();
        assert!(!loader.file_loaded());
    }

    #[test]
    fn test_loader_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".yaml").unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_loader_with_string_rejects_unknown_keys() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string(r#"{"decoder": {"max_body_bytes": 0}}"#, ConfigFormat::Json)
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FnbindConfig::default();
        apply_env_vars(
            &mut config,
            "FNBIND",
            vars(&[
                ("FNBIND__SERVER__HTTP_ADDR", "127.0.0.1:7000"),
                ("FNBIND__SERVER__REQUEST_TIMEOUT_MS", "1500"),
                ("FNBIND__DECODER__MAX_BODY_BYTES", "4096"),
                ("FNBIND__DECODER__DISALLOW_UNKNOWN_FIELDS", "off"),
                ("FNBIND__LOGGING__FORMAT", "Pretty"),
                ("FNBIND__METRICS__ENABLED", "yes"),
                ("OTHER__SERVER__HTTP_ADDR", "10.0.0.1:1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:7000");
        assert_eq!(config.server.request_timeout_ms, 1500);
        assert_eq!(config.decoder.max_body_bytes, 4096);
        assert!(!config.decoder.disallow_unknown_fields);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_env_override_bad_integer() {
        let mut config = FnbindConfig::default();
        let err = apply_env_vars(
            &mut config,
            "FNBIND",
            vars(&[("FNBIND__DECODER__MAX_BODY_BYTES", "lots")]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("FNBIND__DECODER__MAX_BODY_BYTES"));
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_env_override_bad_flag() {
        let mut config = FnbindConfig::default();
        let result = apply_env_vars(
            &mut config,
            "FNBIND",
            vars(&[("FNBIND__SERVER__ROUTE_METRICS", "maybe")]),
        );
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_env_unknown_key_ignored() {
        let mut config = FnbindConfig::default();
        apply_env_vars(&mut config, "FNBIND", vars(&[("FNBIND__CACHE__SIZE", "1")])).unwrap();
        assert_eq!(config, FnbindConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["true", "1", "YES", "on"] {
            assert_eq!(parse_bool(yes), Some(true));
        }
        for no in ["false", "0", "No", "OFF"] {
            assert_eq!(parse_bool(no), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
    }
}
