//! Source constructor tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stream::{CancellationToken, StopReason, Stream, StreamConfig};
use tokio::time::{timeout, Duration};

#[tokio::test]
async fn test_from_vec_preserves_order() {
    let ctx = CancellationToken::new();
    let mut channel = Stream::from_vec(&ctx, vec![1, 2, 3, 4, 5, 6]).get_channel();

    let mut expected = 1;
    while let Some(value) = timeout(Duration::from_secs(1), channel.recv())
        .await
        .expect("receive within timeout")
    {
        assert_eq!(value, expected, "unexpected stream value");
        expected += 1;
    }
    assert_eq!(expected, 7, "stream should yield all six values");
}

#[tokio::test]
async fn test_from_vec_to_vec_round_trip() {
    let ctx = CancellationToken::new();
    let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let result = timeout(
        Duration::from_secs(1),
        Stream::from_vec(&ctx, values.clone()).to_vec(),
    )
    .await
    .expect("drain within timeout");
    assert_eq!(result, values);
}

#[tokio::test]
async fn test_from_vec_empty() {
    let ctx = CancellationToken::new();
    let source = Stream::<u8>::from_vec(&ctx, Vec::new());
    let stats = source.stats();
    let result = source.to_vec().await;
    assert!(result.is_empty());

    timeout(Duration::from_secs(1), async {
        while !stats.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("source finishes");
    assert_eq!(stats.stop_reason(), Some(StopReason::Exhausted));
}

#[tokio::test]
async fn test_from_vec_pre_cancelled() {
    let ctx = CancellationToken::new();
    ctx.cancel();
    let result = Stream::from_vec(&ctx, (0..100).collect::<Vec<_>>())
        .to_vec()
        .await;
    assert!(result.is_empty(), "cancelled source should emit nothing");
}

#[tokio::test]
async fn test_from_vec_with_small_buffer() {
    let ctx = CancellationToken::new();
    let config = StreamConfig::new().with_buffer_size(1);
    let source = Stream::from_vec_with_config(&ctx, (0..50).collect::<Vec<_>>(), &config);
    assert_eq!(source.buffer_size(), 1);

    let mapped = source.map(&ctx, |v| v + 1);
    assert_eq!(mapped.buffer_size(), 1, "operators inherit the buffer size");
    let result = mapped.to_vec().await;
    assert_eq!(result, (1..=50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_generate_until_generator_cancels() {
    let ctx = CancellationToken::new();
    let generator_ctx = ctx.clone();
    let mut count = 0;
    let generator = move || {
        let value = count;
        count += 1;
        if count >= 10 {
            generator_ctx.cancel();
        }
        value
    };

    let mut channel = Stream::generate(&ctx, generator).get_channel();
    let mut received = Vec::new();
    while let Some(value) = timeout(Duration::from_secs(1), channel.recv())
        .await
        .expect("generated stream should close after cancel")
    {
        received.push(value);
    }

    assert_eq!(received, (0..9).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_generate_not_called_after_stop() {
    let ctx = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source = Stream::generate(&ctx, move || counter.fetch_add(1, Ordering::SeqCst));
    let stats = source.stats();

    let first = source.first().await;
    assert_eq!(first, Some(0));

    timeout(Duration::from_secs(1), async {
        while !stats.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("generator source finishes after first");

    let after_stop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    assert_eq!(stats.stop_reason(), Some(StopReason::Stopped));
}
