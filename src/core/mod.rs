pub mod aggregator;
pub mod catalog;
pub mod dataset;
pub mod decoder;
pub mod etl;
pub mod fetcher;
pub mod report;

pub use crate::domain::model::{
    AggregationSummary, FilterCriteria, FilterOutcome, ReportRow, SourceOutcome, SourceStatus,
    ZoneRow,
};
pub use crate::domain::ports::{ConfigProvider, Operator, ZoneFetcher};
pub use crate::utils::error::Result;
