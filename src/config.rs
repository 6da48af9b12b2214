use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVICE_ROOT: &str = "https://assignment-todolist-api.vercel.app/api";
pub const DEFAULT_TENANT_ID: &str = "doit";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub service_root: String,
    pub tenant_id: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub log_file: Option<PathBuf>,
}

// Shape of config.toml, every key optional
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    service_root: Option<String>,
    tenant_id: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service_root: DEFAULT_SERVICE_ROOT.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_file: dirs::cache_dir().map(|dir| dir.join("doit-tui").join("doit-tui.log")),
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `DOIT_*` environment variables.
    pub fn load() -> Result<Config, ConfigError> {
        let file = match config_path() {
            Some(path) if path.exists() => {
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                        path: path.display().to_string(),
                        source,
                    })?;
                Some(contents)
            }
            _ => None,
        };

        Config::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(contents) = file {
            let file: FileConfig = toml::from_str(contents)?;
            if let Some(root) = file.service_root {
                config.service_root = root;
            }
            if let Some(tenant) = file.tenant_id {
                config.tenant_id = tenant;
            }
            if let Some(size) = file.page_size {
                config.page_size = size;
            }
            if let Some(secs) = file.timeout_secs {
                config.timeout = Duration::from_secs(secs);
            }
            if file.log_file.is_some() {
                config.log_file = file.log_file;
            }
        }

        if let Some(root) = env("DOIT_SERVICE_ROOT") {
            config.service_root = root;
        }
        if let Some(tenant) = env("DOIT_TENANT_ID") {
            config.tenant_id = tenant;
        }
        if let Some(size) = env("DOIT_PAGE_SIZE") {
            config.page_size = parse_number("DOIT_PAGE_SIZE", &size)?;
        }
        if let Some(secs) = env("DOIT_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("DOIT_TIMEOUT_SECS", &secs)?);
        }
        if let Some(path) = env("DOIT_LOG_FILE") {
            config.log_file = Some(PathBuf::from(path));
        }

        config.service_root = config.service_root.trim().trim_end_matches('/').to_string();
        config.tenant_id = config.tenant_id.trim().to_string();

        if config.service_root.is_empty() {
            return Err(ConfigError::Empty("service_root"));
        }
        if config.tenant_id.is_empty() {
            return Err(ConfigError::Empty("tenant_id"));
        }
        if config.page_size == 0 {
            return Err(ConfigError::Number {
                name: "page_size",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    pub fn base_url(&self) -> String {
        format!("{}/{}", self.service_root, self.tenant_id)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("doit-tui").join("config.toml"))
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Number {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = Config::from_sources(None, env_from(&[])).unwrap();
        assert_eq!(config.service_root, DEFAULT_SERVICE_ROOT);
        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = r#"
            service_root = "http://localhost:3000/api/"
            tenant_id = "team-a"
            page_size = 25
        "#;
        let config = Config::from_sources(Some(file), env_from(&[])).unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000/api/team-a");
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = r#"tenant_id = "team-a""#;
        let env = env_from(&[("DOIT_TENANT_ID", "team-b"), ("DOIT_TIMEOUT_SECS", "3")]);
        let config = Config::from_sources(Some(file), env).unwrap();
        assert_eq!(config.tenant_id, "team-b");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_empty_tenant_is_rejected() {
        let err = Config::from_sources(None, env_from(&[("DOIT_TENANT_ID", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty("tenant_id")));
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let err =
            Config::from_sources(None, env_from(&[("DOIT_PAGE_SIZE", "ten")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Number {
                name: "DOIT_PAGE_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let err = Config::from_sources(Some("page_size = \"many\""), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
