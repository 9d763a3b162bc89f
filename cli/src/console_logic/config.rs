use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use lib_sync::configs::{ConfigError, SyncSettings};

const APP_DIR: &str = "mileage_console";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Interactive console for the mileage telemetry backend", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "MILEAGE_BASE_URL", help = "Root URL of the telemetry backend.")]
    pub base_url: Option<String>,

    #[clap(long, env = "MILEAGE_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "MILEAGE_REQUEST_TIMEOUT_SECS", help = "Per-request timeout in seconds.")]
    pub request_timeout_secs: Option<u64>,

    #[clap(long, env = "MILEAGE_USER_AGENT", help = "User-Agent header sent with every request.")]
    pub user_agent: Option<String>,

    #[clap(long, env = "MILEAGE_DEFAULT_MILEAGE", help = "Initial value of the mileage input.")]
    pub default_mileage: Option<f64>,

    #[clap(long, env = "MILEAGE_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "MILEAGE_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl Config {
    // 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            base_url: other.base_url.or(self.base_url),
            config_path: other.config_path.or(self.config_path),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            user_agent: other.user_agent.or(self.user_agent),
            default_mileage: other.default_mileage.or(self.default_mileage),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn into_settings(self) -> SyncSettings {
        let defaults = SyncSettings::default();
        SyncSettings {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(defaults.request_timeout_secs),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            default_mileage: self.default_mileage.unwrap_or(defaults.default_mileage),
            log_dir: self.log_dir.unwrap_or(defaults.log_dir),
            log_level: self.log_level.unwrap_or(defaults.log_level),
        }
    }
}

impl From<SyncSettings> for Config {
    fn from(settings: SyncSettings) -> Self {
        Config {
            base_url: Some(settings.base_url),
            config_path: None,
            request_timeout_secs: Some(settings.request_timeout_secs),
            user_agent: Some(settings.user_agent),
            default_mileage: Some(settings.default_mileage),
            log_dir: Some(settings.log_dir),
            log_level: Some(settings.log_level),
        }
    }
}

/// Settings resolved from every source, plus the file that contributed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: SyncSettings,
    pub source_file: Option<PathBuf>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// defaults < config file < environment and command line.
pub fn load_config() -> Result<LoadedConfig, ConfigError> {
    // .env must be applied before clap reads the environment
    let _ = dotenvy::dotenv();
    resolve(Config::parse(), default_config_path())
}

pub fn resolve(cli: Config, fallback_path: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let mut current = Config::from(SyncSettings::default());

    // An explicitly named file must exist, the fallback location is optional.
    let source_file = match cli.config_path.clone() {
        Some(path) => Some(path),
        None => fallback_path.filter(|path| path.exists()),
    };
    if let Some(path) = &source_file {
        current = current.merge(read_file(path)?);
    }

    let settings = current.merge(cli).into_settings();
    settings.validate()?;
    Ok(LoadedConfig { settings, source_file })
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Config {
        let mut argv = vec!["mileage_console"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    fn config_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let loaded = resolve(Config::default(), None).unwrap();
        assert_eq!(loaded.settings, SyncSettings::default());
        assert!(loaded.source_file.is_none());
    }

    #[test]
    fn command_line_overrides_file_which_overrides_defaults() {
        let file = config_file(r#"{ "baseUrl": "http://file.example/", "logLevel": "debug", "defaultMileage": 7 }"#);
        let path = file.path().to_string_lossy().to_string();

        let loaded = resolve(
            cli(&["--config-path", &path, "--base-url", "http://cli.example/"]),
            None,
        )
        .unwrap();

        assert_eq!(loaded.settings.base_url, "http://cli.example/");
        assert_eq!(loaded.settings.log_level, "debug");
        assert_eq!(loaded.settings.default_mileage, 7.0);
        assert_eq!(loaded.settings.request_timeout_secs, 10);
        assert_eq!(loaded.source_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn missing_fallback_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = resolve(Config::default(), Some(dir.path().join("absent.json"))).unwrap();
        assert!(loaded.source_file.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = Config {
            config_path: Some(dir.path().join("absent.json")),
            ..Default::default()
        };
        assert!(matches!(resolve(explicit, None), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let result = resolve(cli(&["--default-mileage=-4"]), None);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
