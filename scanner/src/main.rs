use anyhow::Result;
use common::{load_config, Universe};
use market_data::{fetch_history_with_retry, HttpBarSource};
use scanner::{summary, top_candidates, BatchWriter, ScanPipeline};
use tracing::{info, Level};

const CONFIG_FILE: &str = "scanner_config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting EOD scanner");

    let config = load_config(CONFIG_FILE)?;
    let symbols = Universe::resolve(&config);
    info!(
        "Analyzing {} symbols from {} universe",
        symbols.len(),
        config.universe
    );

    let source = HttpBarSource::new(&config.data_base_url);
    let history = fetch_history_with_retry(&source, &symbols, &config).await?;
    info!("Fetched history for {} symbols", history.len());

    let pipeline = ScanPipeline::new(config.clone());
    let results = pipeline.scan(&history)?;

    let writer = BatchWriter::new(&config.output_dir);
    writer.clean_old_files();
    let paths = writer.write_batch(&results)?;
    info!("Batch written: {}", paths.all.display());

    let long = top_candidates(&results, |r| r.score_long);
    let short = top_candidates(&results, |r| r.score_short);
    println!("{}", summary::render_summary(&long, &short));

    info!("Scan finished: {} symbols in batch", results.len());
    Ok(())
}
