use anyhow::{bail, Result};
use common::load_config;
use market_data::{HttpBarSource, QuoteCache, SystemClock};
use prediction::outcomes::{self, PERFORMANCE_HISTORY_FILE};
use prediction::{latest_batch_file, PredictionEngine};
use scanner::read_batch;
use std::path::Path;
use tracing::{info, warn, Level};

const CONFIG_FILE: &str = "scanner_config.toml";
const DEFAULT_DAYS_BACK: usize = 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "predict".to_string());
    let config = load_config(CONFIG_FILE)?;

    match mode.as_str() {
        "collect" => {
            let source = HttpBarSource::new(&config.data_base_url);
            let records =
                outcomes::collect_history(&source, &config, DEFAULT_DAYS_BACK).await?;
            info!("Collected {} labeled records", records.len());
        }
        "train" => {
            let history_path = Path::new(&config.models_dir).join(PERFORMANCE_HISTORY_FILE);
            let records = if history_path.exists() {
                info!("Loading labeled history from {}", history_path.display());
                outcomes::load_history(&history_path)?
            } else {
                let source = HttpBarSource::new(&config.data_base_url);
                outcomes::collect_history(&source, &config, DEFAULT_DAYS_BACK).await?
            };

            let mut engine = PredictionEngine::new(config);
            match engine.train(&records)? {
                Some(report) => info!(
                    "Trained on {} samples, holdout accuracy {:.2}%",
                    report.samples,
                    report.test_accuracy * 100.0
                ),
                None => warn!("Training skipped; not enough labeled history yet"),
            }
        }
        "predict" => {
            let Some(batch) = latest_batch_file(Path::new(&config.output_dir))? else {
                bail!("no signal batches found in {}", config.output_dir);
            };
            info!("Using latest signals: {}", batch.display());
            let signals = read_batch(&batch)?;

            let mut engine = PredictionEngine::new(config.clone());
            if !engine.load()? {
                bail!("model not available; run with `train` first");
            }
            let predictions = engine.predict(&signals)?;
            engine.write_report(&predictions)?;

            // live prices for the top picks, TTL-cached per config
            let mut quotes = QuoteCache::new(
                HttpBarSource::new(&config.data_base_url),
                SystemClock,
                config.quote_ttl_secs,
            );
            let top_symbols: Vec<String> = predictions
                .iter()
                .take(10)
                .map(|p| p.symbol.clone())
                .collect();
            match quotes.get(&top_symbols).await {
                Ok(live) => {
                    for p in predictions.iter().take(10) {
                        if let Some(q) = live.get(&p.symbol) {
                            info!(
                                "{}: LTP {:.2} ({:+.2}%) - {}",
                                p.symbol, q.last_price, q.change_pct, p.recommendation
                            );
                        }
                    }
                }
                Err(e) => warn!("Live quotes unavailable: {:#}", e),
            }
        }
        other => bail!("unknown mode `{}`; expected collect, train or predict", other),
    }

    Ok(())
}
