//! Transformation stages
//!
//! Each operator consumes an upstream [`Stream`] and produces a new one backed
//! by its own worker and output channel. Operators process values strictly in
//! order, one at a time.

mod distinct;
mod filter;
mod map;
mod skip;
mod take;

pub use distinct::DistinctOperator;
pub use filter::FilterOperator;
pub use map::MapOperator;
pub use skip::SkipOperator;
pub use take::TakeOperator;

use tokio_util::sync::CancellationToken;

use crate::stage::run_operator;
use crate::Stream;

/// Per-value logic of a stage.
pub trait Operator<T>: Send + 'static {
    type Output: Send + 'static;

    /// Stage kind used in stage ids, logs and metric labels.
    const KIND: &'static str;

    /// Handle one upstream value; `None` drops it.
    fn apply(&mut self, value: T) -> Option<Self::Output>;

    /// Checked before every read; once true the stage stops without reading
    /// further from upstream.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Run `operator` as a new stage reading from this stream.
    ///
    /// Panics if this stream has already been opened.
    pub fn through<O>(self, ctx: &CancellationToken, operator: O) -> Stream<O::Output>
    where
        O: Operator<T>,
    {
        let capacity = self.buffer_size();
        self.through_with_capacity(ctx, capacity, operator)
    }

    pub(crate) fn through_with_capacity<O>(
        self,
        ctx: &CancellationToken,
        capacity: usize,
        operator: O,
    ) -> Stream<O::Output>
    where
        O: Operator<T>,
    {
        let inlet = self.open();
        let upstream = self.done_token().clone().drop_guard();
        tracing::debug!(upstream = %self.id(), kind = O::KIND, "attaching operator");
        Stream::launch(O::KIND, ctx, self.buffer_size(), capacity, move |stage| {
            run_operator(operator, inlet, upstream, stage)
        })
    }
}
