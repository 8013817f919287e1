use std::sync::Arc;

mod app;
mod config;
mod credentials;
mod db;
mod error;
mod fetch;
mod models;
mod normalize;
mod scheduler;

use app::Collector;
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and above by default; logs are the only
    // observability channel for scheduled runs)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let schedule = args.iter().any(|arg| arg == "--schedule");

    // Load configuration
    let config = Config::load()?;

    // Fail fast on missing credentials, before any network call
    let api_key = credentials::resolve_api_key(&config);
    if let Err(e) = config.validate(&api_key) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    let api_key = api_key.unwrap_or_default();

    let collector = Collector::new(&config, api_key).await?;

    if schedule {
        tracing::info!(hours = ?scheduler::TRIGGER_HOURS, "starting scheduled collection");
        let collector = Arc::new(collector);
        scheduler::run_daily(move || {
            let collector = collector.clone();
            async move {
                collector.run_all().await;
            }
        })
        .await;
    } else {
        let runs = collector.run_all().await;
        for run in &runs {
            println!(
                "{}: {} new rows ({} fetched, {} duplicates skipped)",
                run.region, run.written, run.fetched, run.duplicates
            );
        }
    }

    Ok(())
}
