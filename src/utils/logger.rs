use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 環境變數設為 1/true 時改用 JSON 日誌
pub const JSON_LOG_ENV: &str = "ZONE_ETL_LOG_JSON";

fn default_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "zone_etl=debug,info"
    } else {
        "zone_etl=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn json_requested() -> bool {
    std::env::var(JSON_LOG_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn init_cli_logger(verbose: bool) {
    if json_requested() {
        init_json_logger(verbose);
        return;
    }

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(), // 給排程器/日誌收集器使用
        )
        .init();
}
