//! The validating facade callers use instead of talking to a backend directly.
//!
//! # Example
//!
//! ```ignore
//! use mockend::{api::Api, memory::InMemoryStore, record::TodoInput};
//!
//! let api = Api::new(InMemoryStore::new());
//! let todo = api.save_todo(TodoInput::new("Wax Ventricals")).await?;
//! assert!(api.get_todo(&todo.id).await?.is_some());
//! ```

use crate::{
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    query::FilterSpec,
    record::{Label, LabelInput, LabelPatch, Todo, TodoInput, TodoPatch},
};

/// A facade over a [`StoreBackend`].
///
/// Single-record reads reject an empty id with [`StoreError::InvalidArgument`]. Saves
/// create a record when the input has no id and update the existing one otherwise.
#[derive(Debug, Clone)]
pub struct Api<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> Api<B> {
    /// Creates a new facade over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the todo with the given id in resolved form, or `None` if it does not exist.
    pub async fn get_todo(&self, id: &str) -> StoreResult<Option<Todo>> {
        require_id(id, "Todo")?;
        self.backend.get_todo(id).await
    }

    /// Returns all todos in resolved form, or only those matching `filter`.
    pub async fn list_todos(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Todo>> {
        self.backend.list_todos(filter).await
    }

    /// Creates the todo when `input` has no id, otherwise updates the todo with that id.
    pub async fn save_todo(&self, input: TodoInput) -> StoreResult<Todo> {
        match input.id.clone() {
            Some(id) => self.backend.update_todo(&id, input.into()).await,
            None => self.backend.create_todo(input).await,
        }
    }

    /// Creates a todo, generating an id when `input` has none.
    pub async fn create_todo(&self, input: TodoInput) -> StoreResult<Todo> {
        self.backend.create_todo(input).await
    }

    /// Shallow-merges `patch` over an existing todo.
    ///
    /// Fails with [`StoreError::NotFound`] when no todo has the given id.
    pub async fn update_todo(&self, id: &str, patch: TodoPatch) -> StoreResult<Todo> {
        require_id(id, "Todo")?;
        self.backend.update_todo(id, patch).await
    }

    /// Deletes the todo with the given id and returns the id. Deleting twice is not an error.
    pub async fn delete_todo(&self, id: &str) -> StoreResult<String> {
        require_id(id, "Todo")?;
        self.backend.delete_todo(id).await
    }

    /// Returns a copy of the label with the given id, or `None` if it does not exist.
    pub async fn get_label(&self, id: &str) -> StoreResult<Option<Label>> {
        require_id(id, "Label")?;
        self.backend.get_label(id).await
    }

    /// Returns copies of all labels, or only those matching `filter`.
    pub async fn list_labels(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Label>> {
        self.backend.list_labels(filter).await
    }

    /// Creates the label when `input` has no id, otherwise updates the label with that id.
    pub async fn save_label(&self, input: LabelInput) -> StoreResult<Label> {
        match input.id.clone() {
            Some(id) => self.backend.update_label(&id, input.into()).await,
            None => self.backend.create_label(input).await,
        }
    }

    /// Creates a label, generating an id when `input` has none.
    pub async fn create_label(&self, input: LabelInput) -> StoreResult<Label> {
        self.backend.create_label(input).await
    }

    /// Shallow-merges `patch` over an existing label.
    ///
    /// Fails with [`StoreError::NotFound`] when no label has the given id.
    pub async fn update_label(&self, id: &str, patch: LabelPatch) -> StoreResult<Label> {
        require_id(id, "Label")?;
        self.backend.update_label(id, patch).await
    }

    /// Deletes the label with the given id and returns the id.
    ///
    /// Todos referencing the label keep the reference; it is omitted when they are read.
    pub async fn delete_label(&self, id: &str) -> StoreResult<String> {
        require_id(id, "Label")?;
        self.backend.delete_label(id).await
    }
}

fn require_id(id: &str, kind: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidArgument(format!("{kind} id is required")));
    }

    Ok(())
}
