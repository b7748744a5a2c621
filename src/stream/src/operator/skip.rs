use tokio_util::sync::CancellationToken;

use crate::operator::Operator;
use crate::Stream;

/// Drops the first `n` values and forwards the rest.
#[derive(Debug, Clone)]
pub struct SkipOperator {
    remaining: usize,
}

impl SkipOperator {
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }
}

impl<T: Send + 'static> Operator<T> for SkipOperator {
    type Output = T;

    const KIND: &'static str = "skip";

    fn apply(&mut self, value: T) -> Option<T> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return None;
        }
        Some(value)
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Skip the first `count` values. `count == 0` passes everything through.
    pub fn skip(self, ctx: &CancellationToken, count: usize) -> Stream<T> {
        self.through(ctx, SkipOperator::new(count))
    }
}
