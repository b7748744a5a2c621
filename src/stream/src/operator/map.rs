use tokio_util::sync::CancellationToken;

use crate::operator::Operator;
use crate::Stream;

/// One-to-one transform.
pub struct MapOperator<F> {
    transform: F,
}

impl<F> MapOperator<F> {
    pub fn new(transform: F) -> Self {
        Self { transform }
    }
}

impl<T, U, F> Operator<T> for MapOperator<F>
where
    F: FnMut(T) -> U + Send + 'static,
    U: Send + 'static,
{
    type Output = U;

    const KIND: &'static str = "map";

    fn apply(&mut self, value: T) -> Option<U> {
        Some((self.transform)(value))
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Emit `transform(v)` for every upstream value `v`, in order.
    pub fn map<U, F>(self, ctx: &CancellationToken, transform: F) -> Stream<U>
    where
        F: FnMut(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        self.through(ctx, MapOperator::new(transform))
    }
}
