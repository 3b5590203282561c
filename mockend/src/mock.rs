//! A ready-to-use mock backend: store, facade and interceptor wired together.

use std::sync::Arc;

use http::Request;

use mockend_core::{api::Api, backend::StoreBackend, ident::IdGenerator, latency::Latency};
use mockend_intercept::{InterceptConfig, InterceptResult, Interception, Interceptor};
use mockend_memory::{InMemoryStore, InMemoryStoreBuilder, Seed};

use crate::fixtures::Fixtures;

/// A store together with the interceptor serving it.
///
/// In-process callers use [`api`](Mockend::api); simulated network callers go
/// through [`fetch`](Mockend::fetch). Both see the same collections.
#[derive(Debug, Clone)]
pub struct Mockend<B: StoreBackend = InMemoryStore> {
    api: Arc<Api<B>>,
    interceptor: Interceptor,
}

impl Mockend<InMemoryStore> {
    /// Creates a builder backed by a fresh [`InMemoryStore`].
    pub fn builder() -> MockendBuilder {
        MockendBuilder::default()
    }
}

impl<B: StoreBackend + 'static> Mockend<B> {
    /// Wires an existing backend to an interceptor.
    pub fn new(backend: B, config: InterceptConfig) -> InterceptResult<Self> {
        let api = Arc::new(Api::new(backend));
        let interceptor = Interceptor::for_api(config, api.clone())?;

        Ok(Mockend { api, interceptor })
    }

    /// Returns the in-process facade.
    pub fn api(&self) -> &Api<B> {
        &self.api
    }

    /// Returns the interceptor serving the same store.
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Offers a request to the interceptor.
    pub async fn fetch(&self, request: Request<Vec<u8>>) -> InterceptResult<Interception> {
        self.interceptor.intercept(request).await
    }
}

/// Builder for an in-memory [`Mockend`].
///
/// # Example
///
/// ```ignore
/// use mockend::Mockend;
///
/// let mock = Mockend::builder().sample_data().no_latency().build()?;
/// let todos = mock.api().list_todos(None).await?;
/// assert_eq!(todos.len(), 10);
/// ```
#[derive(Debug, Default)]
pub struct MockendBuilder {
    store: InMemoryStoreBuilder,
    config: InterceptConfig,
}

impl MockendBuilder {
    /// Sets the delay awaited by every store operation.
    pub fn latency(mut self, latency: impl Latency + 'static) -> Self {
        self.store = self.store.latency(latency);
        self
    }

    /// Disables the simulated delay.
    pub fn no_latency(mut self) -> Self {
        self.store = self.store.no_latency();
        self
    }

    /// Sets the identifier source for created records.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.store = self.store.id_generator(ids);
        self
    }

    /// Loads the given records when the store is built.
    pub fn seed(mut self, seed: Seed) -> Self {
        self.store = self.store.seed(seed);
        self
    }

    /// Seeds the store with [`Fixtures::sample`].
    pub fn sample_data(self) -> Self {
        self.seed(Fixtures::sample())
    }

    /// Sets the host and prefix the interceptor answers for.
    pub fn config(mut self, config: InterceptConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the store and wires it to an interceptor.
    pub fn build(self) -> InterceptResult<Mockend<InMemoryStore>> {
        Mockend::new(self.store.build(), self.config)
    }
}
