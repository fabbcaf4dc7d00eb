use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::catalog::SourceCatalog;
use crate::core::fetcher::{FetchSettings, DEFAULT_USER_AGENT};
use crate::utils::error::{EtlError, Result};
use crate::utils::retry::RetryConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub fetch: FetchSection,
    pub paths: PathsSection,
    pub filter: FilterSection,
    pub catalog: Option<SourceCatalog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_factor_ms: u64,
    pub max_backoff_seconds: u64,
    pub user_agent: String,
    pub pause_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            max_retries: 5,
            backoff_factor_ms: 800,
            max_backoff_seconds: 120,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pause_ms: 500,
        }
    }
}

impl FetchSection {
    pub fn settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
            retry: RetryConfig {
                max_retries: self.max_retries,
                backoff_factor: Duration::from_millis(self.backoff_factor_ms),
                max_backoff: Duration::from_secs(self.max_backoff_seconds),
            },
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub dataset: String,
    pub report: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            dataset: "all_domains.csv".to_string(),
            report: "result.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub days: Option<i64>,
    pub mask: Option<String>,
    pub reference_date: Option<NaiveDate>,
}

impl ZoneConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ZONE_MIRROR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn catalog(&self) -> SourceCatalog {
        self.catalog.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ZoneConfig::from_toml_str("").unwrap();

        assert_eq!(config.paths.dataset, "all_domains.csv");
        assert_eq!(config.paths.report, "result.csv");
        assert_eq!(config.fetch.settings(), FetchSettings::default());
        assert_eq!(config.fetch.pause(), Duration::from_millis(500));
        assert_eq!(config.catalog(), SourceCatalog::default());
        assert!(config.filter.days.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[fetch]
timeout_seconds = 10
max_retries = 2
pause_ms = 0
user_agent = "zone-etl/ci"

[paths]
dataset = "/tmp/zones/all.tsv"
report = "/tmp/zones/result.tsv"

[filter]
days = 14
mask = "mebel|shkaf"
reference_date = "2024-01-01"

[[catalog.groups]]
name = "mirror"

[[catalog.groups.zones]]
label = "su"
url = "https://mirror.example/su.gz"

[[catalog.groups.zones]]
label = "ru"
url = "https://mirror.example/ru.gz"
"#;

        let config = ZoneConfig::from_toml_str(toml_content).unwrap();

        let settings = config.fetch.settings();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.retry.max_retries, 2);
        assert_eq!(settings.user_agent, "zone-etl/ci");
        assert_eq!(config.fetch.backoff_factor_ms, 800);
        assert_eq!(config.filter.days, Some(14));
        assert_eq!(config.filter.mask.as_deref(), Some("mebel|shkaf"));
        assert_eq!(
            config.filter.reference_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );

        let catalog = config.catalog();
        let labels: Vec<&str> = catalog.iter().map(|(_, z)| z.label.as_str()).collect();
        assert_eq!(labels, vec!["su", "ru"]);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ZONE_ETL_TEST_MIRROR", "https://mirror.test");

        let toml_content = r#"
[[catalog.groups]]
name = "env"

[[catalog.groups.zones]]
label = "ru"
url = "${ZONE_ETL_TEST_MIRROR}/ru.gz"
"#;

        let config = ZoneConfig::from_toml_str(toml_content).unwrap();
        let catalog = config.catalog();
        let (_, zone) = catalog.iter().next().unwrap();
        assert_eq!(zone.url, "https://mirror.test/ru.gz");

        std::env::remove_var("ZONE_ETL_TEST_MIRROR");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ZoneConfig::from_toml_str("[fetch\ntimeout_seconds = ").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[paths]\ndataset = \"zones.tsv\"\n")
            .unwrap();

        let config = ZoneConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.paths.dataset, "zones.tsv");
        assert_eq!(config.paths.report, "result.csv");
    }
}
