#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use std::time::Duration;

use chrono::NaiveDate;

use crate::core::catalog::SourceCatalog;
use crate::core::fetcher::FetchSettings;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_distinct_paths, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use toml_config::ZoneConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "zone-etl")]
#[command(about = "Download registry zone files and list domains that are about to be released")]
pub struct CliConfig {
    /// Days-left threshold (strict: days_left < DAYS); asked interactively when omitted
    #[arg(long, allow_hyphen_values = true)]
    pub days: Option<i64>,

    /// Domain search mask (word or regex, case-insensitive); asked interactively when omitted
    #[arg(long)]
    pub mask: Option<String>,

    /// Rebuild the zone dataset without asking
    #[arg(long)]
    pub force_update: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Master dataset path (TSV)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Report path (TSV)
    #[arg(long)]
    pub report: Option<String>,

    /// Reference date (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔（若有），再套用命令列覆蓋
    pub fn resolve(&self) -> Result<RunConfig> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                ZoneConfig::from_file(path)?
            }
            None => ZoneConfig::default(),
        };

        let mut run = RunConfig::from_file_config(&file);
        if let Some(dataset) = &self.dataset {
            run.dataset_path = dataset.clone();
        }
        if let Some(report) = &self.report {
            run.report_path = report.clone();
        }
        if self.days.is_some() {
            run.days = self.days;
        }
        if self.mask.is_some() {
            run.mask = self.mask.clone();
        }
        if self.today.is_some() {
            run.reference_date = self.today;
        }
        run.force_update = self.force_update;
        run.monitor = self.monitor;

        Ok(run)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset_path: String,
    pub report_path: String,
    pub force_update: bool,
    pub days: Option<i64>,
    pub mask: Option<String>,
    pub reference_date: Option<NaiveDate>,
    pub catalog: SourceCatalog,
    pub fetch: FetchSettings,
    pub pause: Duration,
    pub monitor: bool,
}

impl RunConfig {
    pub fn from_file_config(file: &ZoneConfig) -> Self {
        Self {
            dataset_path: file.paths.dataset.clone(),
            report_path: file.paths.report.clone(),
            force_update: false,
            days: file.filter.days,
            mask: file.filter.mask.clone(),
            reference_date: file.filter.reference_date,
            catalog: file.catalog(),
            fetch: file.fetch.settings(),
            pause: file.fetch.pause(),
            monitor: false,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_file_config(&ZoneConfig::default())
    }
}

impl ConfigProvider for RunConfig {
    fn dataset_path(&self) -> &str {
        &self.dataset_path
    }

    fn report_path(&self) -> &str {
        &self.report_path
    }

    fn force_update(&self) -> bool {
        self.force_update
    }

    fn days_threshold(&self) -> Option<i64> {
        self.days
    }

    fn name_pattern(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_path("paths.dataset", &self.dataset_path)?;
        validate_path("paths.report", &self.report_path)?;
        validate_distinct_paths(&self.dataset_path, &self.report_path)?;
        validate_positive_number("fetch.timeout_seconds", self.fetch.timeout.as_secs(), 1)?;
        validate_range("fetch.max_retries", self.fetch.retry.max_retries, 0, 20)?;
        validate_non_empty_string("fetch.user_agent", &self.fetch.user_agent)?;
        if let Some(mask) = &self.mask {
            // 提早檢查正規表達式語法
            crate::core::FilterCriteria::new(0, mask)?;
        }
        self.catalog.validate()
    }
}
