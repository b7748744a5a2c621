use tokio_util::sync::CancellationToken;

use crate::operator::Operator;
use crate::Stream;

/// Conditional pass-through.
pub struct FilterOperator<P> {
    predicate: P,
}

impl<P> FilterOperator<P> {
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }
}

impl<T, P> Operator<T> for FilterOperator<P>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    type Output = T;

    const KIND: &'static str = "filter";

    fn apply(&mut self, value: T) -> Option<T> {
        (self.predicate)(&value).then_some(value)
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Keep only the values for which `predicate` holds.
    pub fn filter<P>(self, ctx: &CancellationToken, predicate: P) -> Stream<T>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.through(ctx, FilterOperator::new(predicate))
    }
}
