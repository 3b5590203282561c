//! Storage backend abstraction for labels and todos.
//!
//! The [`StoreBackend`] trait is the seam between the request boundary and the
//! record collections. It exposes the same five operations for each record kind:
//! create, update, delete, get and list.
//!
//! # Not found
//!
//! A missing id is not an error for [`get_label`](StoreBackend::get_label) /
//! [`get_todo`](StoreBackend::get_todo) (they return `None`) nor for deletes (they
//! are idempotent). Updates of an unknown id fail with
//! [`StoreError::NotFound`](crate::error::StoreError::NotFound) and write nothing.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::StoreResult,
    query::FilterSpec,
    record::{Label, LabelInput, LabelPatch, Todo, TodoInput, TodoPatch},
};

/// Abstract interface for record storage backends.
///
/// # Concurrency
///
/// Implementations are shared between concurrently running request handlers. They
/// are not required to serialize writes to the same record: two updates that
/// overlap in time may race, and the one that commits last wins.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates a label, generating an id when the input has none.
    async fn create_label(&self, input: LabelInput) -> StoreResult<Label>;

    /// Shallow-merges `patch` over the label with the given id.
    async fn update_label(&self, id: &str, patch: LabelPatch) -> StoreResult<Label>;

    /// Removes the label with the given id and returns the id.
    async fn delete_label(&self, id: &str) -> StoreResult<String>;

    /// Returns a copy of the label with the given id, if any.
    async fn get_label(&self, id: &str) -> StoreResult<Option<Label>>;

    /// Returns copies of all labels, or of those matching `filter`.
    async fn list_labels(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Label>>;

    /// Creates a todo, generating an id when the input has none, and returns it resolved.
    async fn create_todo(&self, input: TodoInput) -> StoreResult<Todo>;

    /// Shallow-merges `patch` over the todo with the given id and returns it resolved.
    async fn update_todo(&self, id: &str, patch: TodoPatch) -> StoreResult<Todo>;

    /// Removes the todo with the given id and returns the id.
    async fn delete_todo(&self, id: &str) -> StoreResult<String>;

    /// Returns the todo with the given id in resolved form, if any.
    async fn get_todo(&self, id: &str) -> StoreResult<Option<Todo>>;

    /// Returns all todos in resolved form, or those whose resolved form matches `filter`.
    async fn list_todos(&self, filter: Option<&FilterSpec>) -> StoreResult<Vec<Todo>>;
}
