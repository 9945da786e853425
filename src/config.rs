use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Limits applied to list queries
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Page size when the request has no `count`
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Server-enforced upper bound for `count`
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Parsed filters kept for reuse; 0 disables the cache
    #[serde(default = "default_filter_cache_capacity")]
    pub filter_cache_capacity: usize,
}

fn default_count() -> usize {
    100
}

fn default_max_count() -> usize {
    1000
}

fn default_filter_cache_capacity() -> usize {
    256
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            filter_cache_capacity: default_filter_cache_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResponseConfig {
    /// Prefix for `meta.location`, e.g. `https://scim.example.com/scim/v2`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// "rfc3339" (default) or "epoch"
    #[serde(default = "default_datetime_format")]
    pub meta_datetime_format: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_datetime_format() -> String {
    "rfc3339".to_string()
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            meta_datetime_format: default_datetime_format(),
        }
    }
}

impl ResponseConfig {
    pub fn user_location(&self, id: &str) -> String {
        format!("{}/Users/{}", self.base_url.trim_end_matches('/'), id)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit one summary line per query on the `query_log` target
    #[serde(default = "default_query_log")]
    pub query_log: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_query_log() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            query_log: default_query_log(),
        }
    }
}

impl AppConfig {
    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> AppResult<Self> {
        let path = config_path.as_ref();

        if !path.exists() {
            return Err(AppError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        Self::load_from_str(&content).map_err(|e| match e {
            AppError::Yaml(e) => AppError::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            )),
            other => other,
        })
    }

    /// Parse configuration from YAML text, expanding environment variables
    pub fn load_from_str(content: &str) -> AppResult<Self> {
        let expanded = Self::expand_env_vars(content)?;
        let app_config: AppConfig = if expanded.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&expanded)?
        };
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.query.max_count == 0 {
            return Err(AppError::Configuration(
                "query.max_count must be at least 1".to_string(),
            ));
        }
        match self.response.meta_datetime_format.as_str() {
            "rfc3339" | "epoch" => Ok(()),
            other => Err(AppError::Configuration(format!(
                "response.meta_datetime_format must be 'rfc3339' or 'epoch', got '{}'",
                other
            ))),
        }
    }

    /// Expand environment variables in format ${VAR_NAME} or ${VAR_NAME:-default}
    fn expand_env_vars(content: &str) -> AppResult<String> {
        let mut expanded = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            expanded.push_str(&rest[..start]);

            let var_expr = &rest[start + 2..start + 2 + len];
            let (var_name, default_value) = match var_expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr, None),
            };

            match (std::env::var(var_name), default_value) {
                (Ok(value), _) => expanded.push_str(&value),
                (Err(_), Some(default)) => expanded.push_str(default),
                (Err(_), None) => {
                    return Err(AppError::Configuration(format!(
                        "Environment variable {} not found and no default provided",
                        var_name
                    )));
                }
            }
            rest = &rest[start + 2 + len + 1..];
        }

        expanded.push_str(rest);
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("SCIM_QUERY_TEST_MAX", "250");

        let expanded =
            AppConfig::expand_env_vars("max_count: ${SCIM_QUERY_TEST_MAX:-1000}").unwrap();
        assert_eq!(expanded, "max_count: 250");

        let expanded =
            AppConfig::expand_env_vars("base_url: \"${SCIM_QUERY_MISSING:-http://localhost}\"")
                .unwrap();
        assert_eq!(expanded, "base_url: \"http://localhost\"");

        let err = AppConfig::expand_env_vars("level: ${SCIM_QUERY_MISSING_NO_DEFAULT}").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        // Unterminated expressions are left alone
        assert_eq!(AppConfig::expand_env_vars("a: ${OPEN").unwrap(), "a: ${OPEN");

        std::env::remove_var("SCIM_QUERY_TEST_MAX");
    }

    #[test]
    fn test_config_file_loading() {
        let config_content = r#"
query:
  default_count: 25
  max_count: ${SCIM_QUERY_TEST_FILE_MAX:-500}
  filter_cache_capacity: 0

response:
  base_url: "https://scim.example.com/scim/v2/"
  meta_datetime_format: "epoch"

logging:
  level: "debug"
  query_log: false
"#;

        let temp_file = "/tmp/scim_query_test_config.yaml";
        std::fs::write(temp_file, config_content).unwrap();

        let config = AppConfig::load_from_file(temp_file).unwrap();

        assert_eq!(config.query.default_count, 25);
        assert_eq!(config.query.max_count, 500);
        assert_eq!(config.query.filter_cache_capacity, 0);
        assert_eq!(config.response.meta_datetime_format, "epoch");
        assert_eq!(
            config.response.user_location("abc"),
            "https://scim.example.com/scim/v2/Users/abc"
        );
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.query_log);

        std::fs::remove_file(temp_file).unwrap();
    }

    #[test]
    fn test_missing_config_file() {
        let err = AppConfig::load_from_file("/nonexistent/path/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.query.default_count, 100);
        assert_eq!(config.query.max_count, 1000);
        assert_eq!(config.query.filter_cache_capacity, 256);
        assert_eq!(config.response.base_url, "http://localhost:3000");
        assert_eq!(config.response.meta_datetime_format, "rfc3339");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.query_log);
    }

    #[test]
    fn test_partial_and_empty_documents_use_defaults() {
        let config = AppConfig::load_from_str("query:\n  max_count: 50\n").unwrap();
        assert_eq!(config.query.max_count, 50);
        assert_eq!(config.query.default_count, 100);
        assert_eq!(config.response.base_url, "http://localhost:3000");

        let config = AppConfig::load_from_str("").unwrap();
        assert_eq!(config.query.max_count, 1000);
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_file = "/tmp/scim_query_invalid_config.yaml";
        std::fs::write(temp_file, "invalid: yaml: content: [").unwrap();

        let err = AppConfig::load_from_file(temp_file).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));

        std::fs::remove_file(temp_file).unwrap();
    }

    #[test]
    fn test_validation() {
        let err = AppConfig::load_from_str("query:\n  max_count: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_count"));

        let err = AppConfig::load_from_str("response:\n  meta_datetime_format: iso\n").unwrap_err();
        assert!(err.to_string().contains("meta_datetime_format"));
    }
}
