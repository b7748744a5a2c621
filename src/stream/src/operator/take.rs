use tokio_util::sync::CancellationToken;

use crate::operator::Operator;
use crate::Stream;

/// Forwards at most `n` values, then stops its stage.
#[derive(Debug, Clone)]
pub struct TakeOperator {
    remaining: usize,
}

impl TakeOperator {
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }
}

impl<T: Send + 'static> Operator<T> for TakeOperator {
    type Output = T;

    const KIND: &'static str = "take";

    fn apply(&mut self, value: T) -> Option<T> {
        self.remaining = self.remaining.checked_sub(1)?;
        Some(value)
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Emit the first `count` values and stop without reading further.
    ///
    /// Stopping cancels the upstream stream's done token, which in turn stops
    /// every stage above it.
    pub fn take(self, ctx: &CancellationToken, count: usize) -> Stream<T> {
        let capacity = count.min(self.buffer_size());
        self.through_with_capacity(ctx, capacity, TakeOperator::new(count))
    }
}
