//! Simulated I/O latency.
//!
//! Every store operation awaits a [`Latency`] once. The delay has no effect on
//! results, but it is a real suspension point: other operations can run while one
//! is waiting, which is how concurrent updates to the same record come to race.

use std::{fmt::Debug, sync::Arc, time::Duration};

use futures::future::{self, BoxFuture, FutureExt};

/// The default delay applied to each store operation.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(200);

/// Produces the delay awaited by each store operation.
pub trait Latency: Send + Sync + Debug {
    /// Returns a future that resolves once the simulated latency has elapsed.
    fn delay(&self) -> BoxFuture<'static, ()>;
}

/// Sleeps for a fixed duration on the tokio timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLatency(pub Duration);

impl Default for FixedLatency {
    fn default() -> Self {
        FixedLatency(DEFAULT_LATENCY)
    }
}

impl Latency for FixedLatency {
    fn delay(&self) -> BoxFuture<'static, ()> {
        tokio::time::sleep(self.0).boxed()
    }
}

/// Resolves immediately. Still a suspension point for the executor, but with no timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLatency;

impl Latency for NoLatency {
    fn delay(&self) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}

impl<L: Latency + ?Sized> Latency for Arc<L> {
    fn delay(&self) -> BoxFuture<'static, ()> {
        (**self).delay()
    }
}
