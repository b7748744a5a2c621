//! Terminal consumer tests

use futures::StreamExt;
use stream::{CancellationToken, StageStats, StopReason, Stream};
use tokio::time::{timeout, Duration};

async fn wait_finished(stats: &StageStats) {
    timeout(Duration::from_secs(1), async {
        while !stats.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("stage {} did not finish", stats.stage_id()));
}

fn counter() -> impl FnMut() -> u64 + Send + 'static {
    let mut current = 0;
    move || {
        let value = current;
        current += 1;
        value
    }
}

#[tokio::test]
async fn test_first_from_generator() {
    let ctx = CancellationToken::new();
    let value = timeout(
        Duration::from_secs(1),
        Stream::generate(&ctx, counter()).first(),
    )
    .await
    .expect("first within timeout");
    assert_eq!(value, Some(0));
}

#[tokio::test]
async fn test_first_on_cancelled_context() {
    let ctx = CancellationToken::new();
    ctx.cancel();
    let value = Stream::generate(&ctx, counter()).first().await;
    assert_eq!(value, None, "cancelled stream should report not found");
}

#[tokio::test]
async fn test_first_on_empty_stream() {
    let ctx = CancellationToken::new();
    let value = Stream::<u64>::from_vec(&ctx, Vec::new()).first().await;
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_first_stops_whole_chain() {
    let ctx = CancellationToken::new();
    let source = Stream::generate(&ctx, counter());
    let source_stats = source.stats();
    let mapped = source.map(&ctx, |v| v * 10);
    let map_stats = mapped.stats();
    let filtered = mapped.filter(&ctx, |v| *v > 30);
    let filter_stats = filtered.stats();

    let value = filtered.first().await;
    assert_eq!(value, Some(40));

    wait_finished(&filter_stats).await;
    wait_finished(&map_stats).await;
    wait_finished(&source_stats).await;
    assert_eq!(source_stats.stop_reason(), Some(StopReason::Stopped));
    assert!(!ctx.is_cancelled(), "first must not cancel the caller context");
}

#[tokio::test]
async fn test_to_vec_then_stats() {
    let ctx = CancellationToken::new();
    let source = Stream::from_vec(&ctx, vec![3, 1, 2]);
    let stats = source.stats();
    assert_eq!(source.to_vec().await, vec![3, 1, 2]);

    wait_finished(&stats).await;
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.records_out, 3);
    assert_eq!(snapshot.stop_reason, Some(StopReason::Exhausted));

    let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
    assert_eq!(json["stop_reason"], "exhausted");
}

#[tokio::test]
async fn test_into_stream() {
    let ctx = CancellationToken::new();
    let collected: Vec<u64> = Stream::generate(&ctx, counter())
        .take(&ctx, 5)
        .into_stream()
        .collect()
        .await;
    assert_eq!(collected, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_dropped_channel_detaches_worker() {
    let ctx = CancellationToken::new();
    let source = Stream::generate(&ctx, counter());
    let stats = source.stats();

    let mut channel = source.get_channel();
    assert_eq!(channel.recv().await, Some(0));
    drop(channel);
    drop(source);

    wait_finished(&stats).await;
    assert_eq!(stats.stop_reason(), Some(StopReason::Detached));
}

#[tokio::test]
async fn test_dropped_channel_detaches_filtering_operator() {
    let ctx = CancellationToken::new();
    let source = Stream::generate(&ctx, counter());
    let source_stats = source.stats();
    let filtered = source.filter(&ctx, |_| false);
    let filter_stats = filtered.stats();

    drop(filtered.get_channel());

    wait_finished(&filter_stats).await;
    assert_eq!(filter_stats.stop_reason(), Some(StopReason::Detached));
    wait_finished(&source_stats).await;
}

#[tokio::test]
#[should_panic(expected = "stream already opened")]
async fn test_get_channel_twice_panics() {
    let ctx = CancellationToken::new();
    let source = Stream::from_vec(&ctx, vec![1, 2, 3]);
    let _first = source.get_channel();
    assert!(source.is_opened());
    let _second = source.get_channel();
}

#[tokio::test]
#[should_panic(expected = "stream already opened")]
async fn test_operator_after_get_channel_panics() {
    let ctx = CancellationToken::new();
    let source = Stream::from_vec(&ctx, vec![1, 2, 3]);
    let _channel = source.get_channel();
    let _mapped = source.map(&ctx, |v| v + 1);
}
