pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::StdinOperator, CliConfig};
pub use config::{toml_config::ZoneConfig, RunConfig};

pub use core::{
    aggregator::Aggregator, catalog::SourceCatalog, etl::EtlEngine, fetcher::HttpFetcher,
    report::ReportEngine,
};
pub use utils::error::{EtlError, Result};
