//! Stream handle
//!
//! A [`Stream`] is the read side of one stage: the receiver of the stage's
//! bounded output channel plus the done token that asks the stage to stop.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::stage::{join_upstream, StageContext, StageId, StageStats};

/// What a consumer takes over when it opens a stream: the channel and the
/// worker task writing into it.
pub(crate) struct Inlet<T> {
    pub(crate) receiver: mpsc::Receiver<T>,
    pub(crate) task: JoinHandle<()>,
}

/// Single-consumer handle to the ordered values produced by a stage worker.
///
/// The backing worker starts as soon as the stream is built. The channel may be
/// opened exactly once, either by an operator, a terminal consumer, or
/// [`Stream::get_channel`]; opening it a second time panics.
pub struct Stream<T> {
    // `get_channel` hands the receiver out through `&self`, so it lives in a
    // slot that can be emptied; `opened` alone decides who may empty it.
    inlet: Mutex<Option<Inlet<T>>>,
    opened: AtomicBool,
    done: CancellationToken,
    stats: Arc<StageStats>,
    buffer_size: usize,
}

impl<T: Send + 'static> Stream<T> {
    /// Spawn `worker` as a new stage writing into a fresh channel of `capacity`.
    ///
    /// The done token is derived from `ctx`, so cancelling the context also
    /// stops the stage. Must be called from within a tokio runtime.
    pub(crate) fn launch<F, Fut>(
        kind: &'static str,
        ctx: &CancellationToken,
        buffer_size: usize,
        capacity: usize,
        worker: F,
    ) -> Self
    where
        F: FnOnce(StageContext<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let capacity = capacity.max(1);
        let (output, receiver) = mpsc::channel(capacity);
        let done = ctx.child_token();
        let stage_id = StageId::next(kind);
        let stats = Arc::new(StageStats::new(stage_id.clone()));

        tracing::debug!(stage_id = %stage_id, capacity, "stage starting");
        let task = tokio::spawn(worker(StageContext {
            ctx: ctx.clone(),
            done: done.clone(),
            output,
            stats: Arc::clone(&stats),
        }));

        Self {
            inlet: Mutex::new(Some(Inlet { receiver, task })),
            opened: AtomicBool::new(false),
            done,
            stats,
            buffer_size,
        }
    }

    /// Take the receiver and the worker handle. The flag is checked and set in
    /// one atomic step, so only the first caller ever reaches the slot.
    pub(crate) fn open(&self) -> Inlet<T> {
        let inlet = if self.opened.swap(true, Ordering::AcqRel) {
            None
        } else {
            self.inlet
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        };
        inlet.unwrap_or_else(|| panic!("stream already opened: {}", self.stats.stage_id()))
    }

    /// Token that stops this stream's worker when cancelled.
    pub(crate) fn done_token(&self) -> &CancellationToken {
        &self.done
    }

    /// Expose the raw channel for caller-driven iteration.
    ///
    /// Dropping the receiver stops the worker and everything upstream of it.
    /// The worker task is detached: a panicking stage only shows up here as
    /// an early close.
    pub fn get_channel(&self) -> mpsc::Receiver<T> {
        self.open().receiver
    }

    /// Adapt the channel into a [`futures::Stream`]. Same caveat as
    /// [`Stream::get_channel`] about panicking stages.
    pub fn into_stream(self) -> ReceiverStream<T> {
        ReceiverStream::new(self.open().receiver)
    }

    /// Read one value, then stop the worker. `None` when the stream produced
    /// nothing before closing.
    ///
    /// If a stage panicked, the panic resumes here instead of reading as an
    /// empty stream.
    pub async fn first(self) -> Option<T> {
        let Inlet { mut receiver, task } = self.open();
        let _stop = self.done.clone().drop_guard();
        let value = receiver.recv().await;
        if value.is_none() {
            join_upstream(task).await;
        }
        tracing::debug!(stage_id = %self.stats.stage_id(), found = value.is_some(), "first consumed");
        value
    }

    /// Drain every value until the channel closes, preserving order.
    ///
    /// If a stage panicked, the panic resumes here instead of returning a
    /// truncated vector.
    pub async fn to_vec(self) -> Vec<T> {
        let Inlet { mut receiver, task } = self.open();
        let _stop = self.done.clone().drop_guard();
        let mut values = Vec::new();
        while let Some(value) = receiver.recv().await {
            values.push(value);
        }
        join_upstream(task).await;
        tracing::debug!(stage_id = %self.stats.stage_id(), len = values.len(), "stream drained");
        values
    }
}

impl<T> Stream<T> {
    pub fn id(&self) -> &StageId {
        self.stats.stage_id()
    }

    /// Shared statistics of the worker behind this stream. They stay readable
    /// after the stream itself has been consumed.
    pub fn stats(&self) -> Arc<StageStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_finished(&self) -> bool {
        self.stats.is_finished()
    }

    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Channel capacity inherited by stages built on top of this stream.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("stage_id", self.stats.stage_id())
            .field("opened", &self.is_opened())
            .field("finished", &self.is_finished())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
