//! Source constructors
//!
//! Each constructor spawns one producer worker feeding a bounded channel.

use std::iter;
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::stage::run_source;
use crate::Stream;

const FROM_VEC_KIND: &str = "from_vec";
const GENERATE_KIND: &str = "generate";

impl<T: Send + 'static> Stream<T> {
    /// Stream the values of a finite sequence, in order.
    pub fn from_vec(ctx: &CancellationToken, values: Vec<T>) -> Self {
        Self::from_vec_with_config(ctx, values, &StreamConfig::default())
    }

    pub fn from_vec_with_config(
        ctx: &CancellationToken,
        values: Vec<T>,
        config: &StreamConfig,
    ) -> Self {
        tracing::debug!(len = values.len(), "building sequence source");
        let buffer_size = config.buffer_size();
        Stream::launch(FROM_VEC_KIND, ctx, buffer_size, buffer_size, move |stage| {
            run_source(values.into_iter(), stage)
        })
    }

    /// Stream the results of calling `generator` repeatedly.
    ///
    /// The sequence has no natural end: it runs until `ctx` is cancelled or a
    /// consumer stops it. The generator is not called again once a stop has
    /// been observed.
    pub fn generate<G>(ctx: &CancellationToken, generator: G) -> Self
    where
        G: FnMut() -> T + Send + 'static,
    {
        Self::generate_with_config(ctx, generator, &StreamConfig::default())
    }

    pub fn generate_with_config<G>(
        ctx: &CancellationToken,
        generator: G,
        config: &StreamConfig,
    ) -> Self
    where
        G: FnMut() -> T + Send + 'static,
    {
        let buffer_size = config.buffer_size();
        Stream::launch(GENERATE_KIND, ctx, buffer_size, buffer_size, move |stage| {
            run_source(iter::repeat_with(generator), stage)
        })
    }
}
