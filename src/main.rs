mod logging;

use std::env;
use std::process;
use std::time::Duration;

use crate::logging::{init_logging, LoggingConfig};
use stream::{CancellationToken, Stream, StreamConfig};

const DEFAULT_METRICS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
enum ArgsError {
    #[error("missing argument <{0}>")]
    Missing(&'static str),
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// `chanflow <start> <end> [skip] [take]`
///
/// Bounds are `i32` so every square fits in an `i64`.
#[derive(Debug)]
struct Args {
    start: i32,
    end: i32,
    skip: usize,
    take: Option<usize>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let start = parse_arg(raw.next(), "start")?;
        let end = parse_arg(raw.next(), "end")?;
        let skip = match raw.next() {
            Some(value) => parse_arg(Some(value), "skip")?,
            None => 0,
        };
        let take = raw
            .next()
            .map(|value| parse_arg(Some(value), "take"))
            .transpose()?;
        Ok(Self {
            start,
            end,
            skip,
            take,
        })
    }
}

fn parse_arg<T: std::str::FromStr>(value: Option<String>, name: &'static str) -> Result<T, ArgsError> {
    let value = value.ok_or(ArgsError::Missing(name))?;
    value
        .parse()
        .map_err(|_| ArgsError::Invalid { name, value })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::from_env()?)?;
    let args = Args::parse(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: chanflow <start> <end> [skip] [take]");
        process::exit(1);
    });
    let config = StreamConfig::from_env()?;

    let sampler_stop = CancellationToken::new();
    let sampler = telemetry::spawn_runtime_sampler(
        Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS),
        sampler_stop.clone(),
    );

    let ctx = CancellationToken::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling pipeline");
            interrupt.cancel();
        }
    });

    let source = Stream::from_vec_with_config(&ctx, (args.start..=args.end).collect(), &config);
    let mut stats = vec![source.stats()];
    let squared = source.map(&ctx, |v| i64::from(v) * i64::from(v));
    stats.push(squared.stats());
    let unique = squared.distinct(&ctx);
    stats.push(unique.stats());
    let mut tail = unique.skip(&ctx, args.skip);
    stats.push(tail.stats());
    if let Some(count) = args.take {
        tail = tail.take(&ctx, count);
        stats.push(tail.stats());
    }

    tracing::info!(
        start = args.start,
        end = args.end,
        buffer_size = config.buffer_size(),
        "pipeline running"
    );
    let values = tail.to_vec().await;
    println!("{values:?}");

    sampler_stop.cancel();
    sampler.await?;

    for stage in &stats {
        println!("{}", serde_json::to_string(&stage.snapshot())?);
    }
    print!("{}", telemetry::render_metrics());
    Ok(())
}
