use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use imbalance_ingestor::{
    build_engine,
    cli::{
        commands::Cli,
        params::{load_config, target_date},
    },
    errors::ResolveError,
    io::sink::{CsvFileSink, DataSink},
    models::{dataset::ResolvedDataset, summary::DatasetSummary},
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("imbalance_ingestor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let engine = build_engine(&config).context("failed to set up the HTTP client")?;
    let date = target_date(cli.date, Utc::now());

    let dataset = match engine.resolve(date).await?.require_data() {
        Ok(dataset) => dataset,
        Err(e @ ResolveError::NoDataAvailable { .. }) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    print_header(&dataset);
    if let Some(summary) = DatasetSummary::from_rows(&dataset.rows) {
        print_summary(&summary);
    }
    if !cli.summary_only {
        print_table(&dataset);
    }

    if let Some(dir) = cli.export {
        let path = CsvFileSink::new(dir)
            .write(&dataset)
            .await
            .context("failed to write CSV export")?;
        println!("\nexported {}", path.display());
    }

    Ok(())
}

fn print_header(dataset: &ResolvedDataset) {
    let resolved = dataset
        .resolved_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "imbalance data for {resolved} ({:?}, {} intervals)",
        dataset.source_kind,
        dataset.rows.len()
    );
    if dataset.is_fallback_date() {
        println!(
            "note: nothing published for {} yet; showing {resolved}",
            dataset.requested_date
        );
    }
}

fn print_summary(summary: &DatasetSummary) {
    println!();
    println!(
        "latest    {}  price {:>9.2}  volume {:>9.2}",
        summary.latest_interval.format("%H:%M%:z"),
        summary.latest_price,
        summary.latest_volume
    );
    println!(
        "price     mean {:.2}  min {:.2}  max {:.2}",
        summary.mean_price, summary.min_price, summary.max_price
    );
    println!(
        "volume    net {:.2}  short {}  long {}",
        summary.net_volume, summary.short_intervals, summary.long_intervals
    );
}

fn print_table(dataset: &ResolvedDataset) {
    println!();
    println!("{:<23}  {:>10}  {:>10}", "interval_start", "price", "volume");
    for row in &dataset.rows {
        println!(
            "{:<23}  {:>10.2}  {:>10.2}",
            row.interval_start.format("%Y-%m-%d %H:%M%:z").to_string(),
            row.price,
            row.volume
        );
    }
}
