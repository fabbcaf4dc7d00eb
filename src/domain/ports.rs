use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Downloads one zone archive and returns the full compressed body.
#[async_trait]
pub trait ZoneFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Operator interaction used by the engine; the core never reads stdin itself.
pub trait Operator: Send + Sync {
    fn confirm(&self, question: &str) -> bool;

    /// `None` when no answer is available (closed input).
    fn ask(&self, question: &str) -> Option<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_path(&self) -> &str;
    fn report_path(&self) -> &str;
    fn force_update(&self) -> bool;
    fn days_threshold(&self) -> Option<i64>;
    fn name_pattern(&self) -> Option<&str>;
    fn reference_date(&self) -> Option<NaiveDate>;
}
