use std::time::Instant;

use tranche::Ticker;
use tranche_demos::common::{demo_builder, midnight};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tranche = demo_builder().max_concurrent_buckets(8).build()?;
    let aapl = Ticker::new("AAPL")?;

    let first = (
        midnight(2020, 1, 1).ok_or("bad date")?,
        midnight(2020, 7, 1).ok_or("bad date")?,
    );
    // Overlaps the first query for three months.
    let second = (
        midnight(2020, 4, 1).ok_or("bad date")?,
        midnight(2020, 10, 1).ok_or("bad date")?,
    );

    for (label, (start, end)) in [("first", first), ("second", second)] {
        let t0 = Instant::now();
        let report = tranche.get_range_report(&aapl, start, end).await?;
        println!(
            "{label}: {} points from {} buckets ({} cached, {} fetched) in {:.2?}",
            report.series.len(),
            report.buckets.len(),
            report.cache_hits(),
            report.upstream_fetches(),
            t0.elapsed(),
        );
        if let (Some(a), Some(b)) = (report.series.points().first(), report.series.points().last()) {
            println!("  {} close={:.2} .. {} close={:.2}", a.timestamp, a.close, b.timestamp, b.close);
        }
    }

    Ok(())
}
