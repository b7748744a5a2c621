//! Lazy, push-based pipelines over bounded tokio channels.
//!
//! A source spawns a worker that pushes values into a bounded channel; each
//! operator spawns another worker that reads the previous channel and writes
//! its own; a terminal consumer drains the last one.
//!
//! ```no_run
//! use stream::Stream;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let ctx = CancellationToken::new();
//! let squares = Stream::from_vec(&ctx, (1..=10).collect())
//!     .filter(&ctx, |v: &i64| v % 2 == 0)
//!     .map(&ctx, |v| v * v)
//!     .to_vec()
//!     .await;
//! assert_eq!(squares, vec![4, 16, 36, 64, 100]);
//! # }
//! ```
//!
//! Cancelling the context passed to a stage stops it. Every stage also stops
//! when the consumer downstream of it finishes early (`first`, `take`) or drops
//! its receiver, and that stop is passed on to every stage above it.

pub mod config;
pub mod operator;
mod source;
pub mod stage;
pub mod stream;

pub use config::{ConfigError, StreamConfig};
pub use operator::Operator;
pub use stage::{StageId, StageStats, StageStatsSnapshot, StopReason};
pub use stream::Stream;
pub use tokio_util::sync::CancellationToken;
