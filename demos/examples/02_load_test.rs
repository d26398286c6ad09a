use std::time::{Duration, Instant};

use chrono::TimeDelta;
use tranche::Ticker;
use tranche_demos::common::{demo_builder, random_date, upstream_latency};

const NUM_TESTS: usize = 100;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tranche = demo_builder().build()?;
    let ticker = Ticker::new("AAPL")?;
    let mut rng = rand::rng();
    let mut times: Vec<Duration> = Vec::with_capacity(NUM_TESTS);

    println!("{} LOAD TEST {}", "*".repeat(10), "*".repeat(10));
    println!(
        "Testing {NUM_TESTS} requests (simulated upstream latency {:?}).",
        upstream_latency()
    );
    println!();

    for _ in 0..NUM_TESTS {
        let start = random_date(&mut rng);
        let end = start + TimeDelta::days(365);
        let t0 = Instant::now();
        tranche.get_range(&ticker, start, end).await?;
        times.push(t0.elapsed());
    }

    let total: Duration = times.iter().sum();
    let n = u32::try_from(times.len()).unwrap_or(u32::MAX).max(1);
    println!();
    println!("{} SUMMARY {}", "*".repeat(10), "*".repeat(10));
    println!("Total time elapsed: {:.2} seconds", total.as_secs_f64());
    println!("Average time elapsed: {:.2} seconds", (total / n).as_secs_f64());

    Ok(())
}
