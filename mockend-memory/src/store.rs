//! In-memory storage implementation for labels and todos.
//!
//! Both collections live in insertion-ordered tables behind one async-aware
//! read-write lock. Locks are only held for synchronous critical sections and are
//! never held across the simulated latency, so writes that overlap in time are
//! not serialized: each update computes its result from the record as it was when
//! the update started and commits it when its delay resolves.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use mea::rwlock::RwLock;

use mockend_core::{
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    ident::{IdGenerator, UuidGenerator},
    latency::{FixedLatency, Latency, NoLatency},
    query::FilterSpec,
    record::{Label, LabelInput, LabelPatch, NormalizedTodo, Record, Todo, TodoInput, TodoPatch},
};

use crate::evaluator::Predicate;

/// A keyed collection that remembers insertion order.
#[derive(Debug, Clone)]
struct Table<T> {
    rows: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table { rows: HashMap::new(), order: Vec::new() }
    }
}

impl<T> Table<T> {
    fn get(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    fn insert(&mut self, id: String, row: T) {
        if self.rows.insert(id.clone(), row).is_none() {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.rows.remove(id);

        if removed.is_some() {
            self.order.retain(|key| key != id);
        }

        removed
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Default)]
struct Collections {
    labels: Table<Label>,
    todos: Table<NormalizedTodo>,
}

impl Collections {
    fn resolve(&self, todo: &NormalizedTodo) -> Todo {
        todo.resolve(|id| self.labels.get(id).cloned())
    }
}

/// Records to load into a store when it is built.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    /// Labels, stored as given.
    pub labels: Vec<Label>,
    /// Todos, normalized on load. Inputs without an id get a generated one.
    pub todos: Vec<TodoInput>,
}

/// In-memory backend holding the label and todo collections.
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state, so clones
/// share the same collections. Each store is constructed explicitly; there is no
/// process-wide instance.
///
/// # Example
///
/// ```ignore
/// use mockend_memory::InMemoryStore;
/// use mockend_core::{backend::StoreBackend, record::LabelInput};
///
/// let store = InMemoryStore::builder().no_latency().build();
/// let label = store.create_label(LabelInput::new("Bug")).await?;
/// assert_eq!(store.get_label(&label.id).await?, Some(label));
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
    latency: Arc<dyn Latency>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        InMemoryStore::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the default latency and UUID identifiers.
    pub fn new() -> Self {
        InMemoryStore::builder().build()
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the number of stored labels and todos.
    pub async fn counts(&self) -> (usize, usize) {
        let collections = self.collections.read().await;
        (collections.labels.len(), collections.todos.len())
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn create_label(&self, input: LabelInput) -> StoreResult<Label> {
        let label = Label::from_input(input, self.ids.generate());
        tracing::debug!(collection = Label::collection_name(), id = %label.id, "Creating record");

        self.latency.delay().await;

        self.collections
            .write()
            .await
            .labels
            .insert(label.id.clone(), label.clone());

        Ok(label)
    }

    async fn update_label(&self, id: &str, patch: LabelPatch) -> StoreResult<Label> {
        let next = match self.collections.read().await.labels.get(id) {
            Some(current) => current.merge(patch),
            None => {
                tracing::warn!(collection = Label::collection_name(), id = %id, "Update of unknown record");
                return Err(StoreError::not_found(Label::collection_name(), id));
            }
        };
        tracing::debug!(collection = Label::collection_name(), id = %id, "Updating record");

        self.latency.delay().await;

        self.collections
            .write()
            .await
            .labels
            .insert(next.id.clone(), next.clone());

        Ok(next)
    }

    async fn delete_label(&self, id: &str) -> StoreResult<String> {
        self.latency.delay().await;

        let removed = self.collections.write().await.labels.remove(id);
        tracing::debug!(collection = Label::collection_name(), id = %id, existed = removed.is_some(), "Deleted record");

        Ok(id.to_string())
    }

    async fn get_label(&self, id: &str) -> StoreResult<Option<Label>> {
        self.latency.delay().await;

        Ok(self.collections.read().await.labels.get(id).cloned())
    }

    async fn list_labels(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Label>> {
        let predicate = filter.map(Predicate::compile);

        self.latency.delay().await;

        let labels = self
            .collections
            .read()
            .await
            .labels
            .values()
            .cloned()
            .collect::<Vec<_>>();

        match predicate {
            Some(predicate) => predicate.filter_records(labels),
            None => Ok(labels),
        }
    }

    async fn create_todo(&self, input: TodoInput) -> StoreResult<Todo> {
        let todo = NormalizedTodo::from_input(input, self.ids.generate(), Utc::now());
        tracing::debug!(collection = Todo::collection_name(), id = %todo.id, "Creating record");

        self.latency.delay().await;

        let mut collections = self.collections.write().await;
        let resolved = collections.resolve(&todo);
        collections.todos.insert(todo.id.clone(), todo);

        Ok(resolved)
    }

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> StoreResult<Todo> {
        let next = match self.collections.read().await.todos.get(id) {
            Some(current) => current.merge(patch, Utc::now()),
            None => {
                tracing::warn!(collection = Todo::collection_name(), id = %id, "Update of unknown record");
                return Err(StoreError::not_found(Todo::collection_name(), id));
            }
        };
        tracing::debug!(collection = Todo::collection_name(), id = %id, "Updating record");

        self.latency.delay().await;

        let mut collections = self.collections.write().await;
        let resolved = collections.resolve(&next);
        collections.todos.insert(next.id.clone(), next);

        Ok(resolved)
    }

    async fn delete_todo(&self, id: &str) -> StoreResult<String> {
        self.latency.delay().await;

        let removed = self.collections.write().await.todos.remove(id);
        tracing::debug!(collection = Todo::collection_name(), id = %id, existed = removed.is_some(), "Deleted record");

        Ok(id.to_string())
    }

    async fn get_todo(&self, id: &str) -> StoreResult<Option<Todo>> {
        self.latency.delay().await;

        let collections = self.collections.read().await;
        Ok(collections.todos.get(id).map(|todo| collections.resolve(todo)))
    }

    async fn list_todos(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Todo>> {
        let predicate = filter.map(Predicate::compile);

        self.latency.delay().await;

        let todos = {
            let collections = self.collections.read().await;
            collections
                .todos
                .values()
                .map(|todo| collections.resolve(todo))
                .collect::<Vec<_>>()
        };

        match predicate {
            Some(predicate) => predicate.filter_records(todos),
            None => Ok(todos),
        }
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use mockend_memory::InMemoryStore;
/// use mockend_core::latency::FixedLatency;
///
/// let store = InMemoryStore::builder()
///     .latency(FixedLatency(Duration::from_millis(50)))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    latency: Option<Arc<dyn Latency>>,
    ids: Option<Arc<dyn IdGenerator>>,
    seed: Seed,
}

impl InMemoryStoreBuilder {
    /// Sets the delay awaited by every operation. Defaults to [`FixedLatency::default`].
    pub fn latency(mut self, latency: impl Latency + 'static) -> Self {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Disables the simulated delay.
    pub fn no_latency(self) -> Self {
        self.latency(NoLatency)
    }

    /// Sets the identifier source. Defaults to [`UuidGenerator`].
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Loads the given records when the store is built.
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Builds and returns a new [`InMemoryStore`].
    pub fn build(self) -> InMemoryStore {
        let latency = self.latency.unwrap_or_else(|| Arc::new(FixedLatency::default()));
        let ids = self.ids.unwrap_or_else(|| Arc::new(UuidGenerator));
        let now = Utc::now();

        let mut collections = Collections::default();

        for label in self.seed.labels {
            collections.labels.insert(label.id.clone(), label);
        }

        for input in self.seed.todos {
            let todo = NormalizedTodo::from_input(input, ids.generate(), now);
            collections.todos.insert(todo.id.clone(), todo);
        }

        tracing::debug!(
            labels = collections.labels.len(),
            todos = collections.todos.len(),
            "Built in-memory store"
        );

        InMemoryStore {
            collections: Arc::new(RwLock::new(collections)),
            latency,
            ids,
        }
    }
}
