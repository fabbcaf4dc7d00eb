use clap::Parser;
use zone_etl::core::etl::RunReport;
use zone_etl::core::SourceStatus;
use zone_etl::utils::error::{EtlError, ErrorSeverity};
use zone_etl::utils::{logger, validation::Validate};
use zone_etl::{Aggregator, CliConfig, EtlEngine, HttpFetcher, StdinOperator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting zone-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let run = match cli.resolve().and_then(|run| run.validate().map(|_| run)) {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            fail(&e);
        }
    };

    if run.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let fetcher = match HttpFetcher::new(&run.fetch) {
        Ok(fetcher) => fetcher,
        Err(e) => fail(&e),
    };
    let aggregator = Aggregator::new(fetcher).with_pause(run.pause);
    let engine = EtlEngine::new_with_monitoring(
        aggregator,
        run.catalog.clone(),
        StdinOperator::new(),
        run.monitor,
    );

    let task = tokio::spawn(async move { engine.run(&run).await });

    tokio::select! {
        joined = task => match joined? {
            Ok(report) => print_report(&report),
            Err(e) => {
                tracing::error!(
                    "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                fail(&e);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Stopped by user");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    if let Some(summary) = &report.aggregation {
        for outcome in &summary.outcomes {
            match &outcome.status {
                SourceStatus::Appended { rows } => {
                    println!("✅ [{}] {}: {} rows", outcome.group, outcome.zone, rows)
                }
                SourceStatus::FetchFailed { class, message }
                | SourceStatus::DecodeFailed { class, message } => {
                    println!("⚠️ [{}] {} skipped: {}: {}", outcome.group, outcome.zone, class, message)
                }
            }
        }
        match summary.total_rows {
            Some(total) => println!(
                "📦 {}: {} rows ({} of {} sources ok)",
                summary.dataset_path,
                total,
                summary.succeeded(),
                summary.outcomes.len()
            ),
            None => println!(
                "📦 {}: row count unavailable ({} of {} sources ok)",
                summary.dataset_path,
                summary.succeeded(),
                summary.outcomes.len()
            ),
        }
    }

    println!(
        "Saved: {} (rows: {})",
        report.report_path.display(),
        report.filter.rows.len()
    );
    for domain in report.filter.preview() {
        println!("  {}", domain);
    }
}

fn fail(e: &EtlError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
