use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::core::aggregator::Aggregator;
use crate::core::catalog::SourceCatalog;
use crate::core::report::ReportEngine;
use crate::domain::model::{AggregationSummary, FilterCriteria, FilterOutcome};
use crate::domain::ports::{ConfigProvider, Operator, ZoneFetcher};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;

pub const UPDATE_QUESTION: &str = "Update the zone dataset now? (YES/NO): ";
pub const DAYS_QUESTION: &str = "Enter days left number: ";
pub const MASK_QUESTION: &str = "Enter domains search mask (word or RegEx): ";

#[derive(Debug)]
pub struct RunReport {
    /// `None` when the existing dataset was reused.
    pub aggregation: Option<AggregationSummary>,
    pub filter: FilterOutcome,
    pub report_path: PathBuf,
}

/// One full run: optional rebuild, then filter and report.
pub struct EtlEngine<F: ZoneFetcher, O: Operator> {
    aggregator: Aggregator<F>,
    catalog: SourceCatalog,
    operator: O,
    monitor: SystemMonitor,
}

impl<F: ZoneFetcher, O: Operator> EtlEngine<F, O> {
    pub fn new(aggregator: Aggregator<F>, catalog: SourceCatalog, operator: O) -> Self {
        Self::new_with_monitoring(aggregator, catalog, operator, false)
    }

    pub fn new_with_monitoring(
        aggregator: Aggregator<F>,
        catalog: SourceCatalog,
        operator: O,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            aggregator,
            catalog,
            operator,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 強制更新、檔案不存在、或操作者同意時重建
    pub fn needs_rebuild(&self, dataset: &Path, force: bool) -> bool {
        if force {
            return true;
        }
        if !dataset.exists() {
            tracing::info!("📂 {} not found, it will be built", dataset.display());
            return true;
        }
        tracing::info!("📂 Found dataset: {}", dataset.display());
        self.operator.confirm(UPDATE_QUESTION)
    }

    pub async fn run<C: ConfigProvider>(&self, config: &C) -> Result<RunReport> {
        let dataset = Path::new(config.dataset_path());

        let aggregation = if self.needs_rebuild(dataset, config.force_update()) {
            let summary = self.aggregator.build(&self.catalog, dataset).await?;
            self.monitor.log_stats("aggregate");
            Some(summary)
        } else {
            tracing::info!("📂 Keeping current {}", dataset.display());
            None
        };

        let criteria = self.resolve_criteria(config)?;
        let reference_date = config.reference_date().unwrap_or_else(today);

        let engine = ReportEngine::new(criteria, reference_date);
        let filter = engine.run(dataset, config.report_path())?;
        self.monitor.log_stats("filter");
        self.monitor.log_final_stats();

        Ok(RunReport {
            aggregation,
            filter,
            report_path: PathBuf::from(config.report_path()),
        })
    }

    fn resolve_criteria<C: ConfigProvider>(&self, config: &C) -> Result<FilterCriteria> {
        let days = match config.days_threshold() {
            Some(days) => days,
            None => {
                let answer = self
                    .operator
                    .ask(DAYS_QUESTION)
                    .ok_or_else(|| EtlError::MissingConfigError {
                        field: "days".to_string(),
                    })?;
                parse_days(&answer)?
            }
        };

        let mask = match config.name_pattern() {
            Some(mask) => mask.to_string(),
            None => self.operator.ask(MASK_QUESTION).unwrap_or_default(),
        };

        FilterCriteria::new(days, mask.trim())
    }
}

pub fn parse_days(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| EtlError::InvalidConfigValueError {
            field: "days".to_string(),
            value: raw.trim().to_string(),
            reason: format!("not an integer: {}", e),
        })
}

/// Local date, no time-of-day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
