use std::collections::HashSet;
use std::hash::Hash;
use tokio_util::sync::CancellationToken;

use crate::operator::Operator;
use crate::Stream;

/// Forwards the first occurrence of every value.
///
/// Values seen so far are kept in a hash set for the lifetime of the stage, so
/// memory grows with the number of distinct values.
#[derive(Debug)]
pub struct DistinctOperator<T> {
    seen: HashSet<T>,
}

impl<T> DistinctOperator<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }
}

impl<T> Default for DistinctOperator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Operator<T> for DistinctOperator<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    type Output = T;

    const KIND: &'static str = "distinct";

    fn apply(&mut self, value: T) -> Option<T> {
        if self.seen.contains(&value) {
            return None;
        }
        self.seen.insert(value.clone());
        Some(value)
    }
}

impl<T> Stream<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    /// Drop values equal to one already emitted, keeping first-occurrence order.
    pub fn distinct(self, ctx: &CancellationToken) -> Stream<T> {
        self.through(ctx, DistinctOperator::new())
    }
}
