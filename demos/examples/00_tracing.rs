use tracing_subscriber::fmt::format::FmtSpan;
use tranche::Ticker;
use tranche_demos::common::{demo_builder, midnight};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize a human-friendly tracing subscriber with env-based filtering.
    // Suggested: RUST_LOG=info,tranche=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let tranche = demo_builder().build()?;
    let aapl = Ticker::new("AAPL")?;
    let start = midnight(2021, 3, 1).ok_or("bad date")?;
    let end = midnight(2021, 4, 1).ok_or("bad date")?;

    // Cold: every bucket goes upstream and is written back.
    let cold = tranche.get_range_report(&aapl, start, end).await?;
    tracing::info!(points = cold.series.len(), fetched = cold.upstream_fetches(), "cold query");

    // Warm: served from the store.
    let warm = tranche.get_range_report(&aapl, start, end).await?;
    tracing::info!(points = warm.series.len(), cached = warm.cache_hits(), "warm query");

    Ok(())
}
