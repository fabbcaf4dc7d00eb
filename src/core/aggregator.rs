use std::path::Path;
use std::time::Duration;

use crate::core::catalog::{SourceCatalog, SourceGroup, ZoneSource};
use crate::core::dataset::{count_rows, DatasetWriter};
use crate::core::decoder::ZoneDecoder;
use crate::domain::model::{AggregationSummary, SourceOutcome, SourceStatus};
use crate::domain::ports::ZoneFetcher;
use crate::utils::error::{EtlError, Result};

pub const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// Builds the master dataset from every source in a catalog.
pub struct Aggregator<F: ZoneFetcher> {
    fetcher: F,
    decoder: ZoneDecoder,
    pause: Duration,
}

impl<F: ZoneFetcher> Aggregator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            decoder: ZoneDecoder::new(),
            pause: DEFAULT_PAUSE,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Delay after each source, successful or not.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// 重建 dataset：先截斷並寫入表頭，再依序處理每個來源。
    ///
    /// A failing source is recorded in the summary and skipped. Only errors
    /// writing the dataset itself abort the run.
    pub async fn build<P: AsRef<Path>>(
        &self,
        catalog: &SourceCatalog,
        dataset_path: P,
    ) -> Result<AggregationSummary> {
        let dataset_path = dataset_path.as_ref();
        let mut writer = DatasetWriter::create(dataset_path)?;

        tracing::info!(
            "🚀 Building {} from {} sources in {} groups",
            dataset_path.display(),
            catalog.len(),
            catalog.groups().len()
        );

        let mut summary = AggregationSummary {
            dataset_path: dataset_path.display().to_string(),
            ..Default::default()
        };

        for (index, group) in catalog.groups().iter().enumerate() {
            tracing::info!(
                "📦 Source #{} {}: {} archives",
                index + 1,
                group.name,
                group.zones.len()
            );

            for zone in &group.zones {
                let status = self.process_source(&mut writer, group, zone).await?;
                summary.rows_appended += match status {
                    SourceStatus::Appended { rows } => rows,
                    _ => 0,
                };
                summary.outcomes.push(SourceOutcome {
                    group: group.name.clone(),
                    zone: zone.label.clone(),
                    url: zone.url.clone(),
                    status,
                });

                if !self.pause.is_zero() {
                    tokio::time::sleep(self.pause).await;
                }
            }
        }

        let path = writer.finish()?;

        // 行數統計失敗不影響已寫入的檔案
        summary.total_rows = match count_rows(&path) {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("⚠️ Could not count rows in {}: {}", path.display(), e);
                None
            }
        };

        tracing::info!(
            "✅ Dataset ready: {} (rows: {}, sources ok: {}, skipped: {})",
            path.display(),
            summary
                .total_rows
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            summary.succeeded(),
            summary.failed()
        );

        Ok(summary)
    }

    async fn process_source(
        &self,
        writer: &mut DatasetWriter,
        group: &SourceGroup,
        zone: &ZoneSource,
    ) -> Result<SourceStatus> {
        tracing::info!("  → downloading {}: {}", zone.label, zone.url);

        let payload = match self.fetcher.fetch(&zone.url).await {
            Ok(payload) => payload,
            Err(e) => {
                log_skipped(group, zone, &e);
                return Ok(SourceStatus::FetchFailed {
                    class: e.class_name().to_string(),
                    message: e.to_string(),
                });
            }
        };
        let payload_len = payload.len();

        let mark = writer.mark()?;
        let mut rows = 0usize;

        for item in self.decoder.decode(payload) {
            match item {
                Ok(row) => {
                    writer.append(&row)?;
                    rows += 1;
                }
                Err(e) => {
                    writer.rollback(mark)?;
                    log_skipped(group, zone, &e);
                    return Ok(SourceStatus::DecodeFailed {
                        class: e.class_name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        writer.flush()?;
        tracing::info!(
            "    OK {} rows from {} ({} compressed bytes)",
            rows,
            zone.label,
            payload_len
        );
        Ok(SourceStatus::Appended { rows })
    }
}

fn log_skipped(group: &SourceGroup, zone: &ZoneSource, error: &EtlError) {
    tracing::warn!(
        group = %group.name,
        zone = %zone.label,
        url = %zone.url,
        "    SKIPPED ({}): {}: {}",
        zone.label,
        error.class_name(),
        error
    );
}
