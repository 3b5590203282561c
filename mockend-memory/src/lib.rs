//! In-memory storage backend for mockend.
//!
//! This crate provides the [`InMemoryStore`], an implementation of the
//! `StoreBackend` trait that keeps labels and todos in process memory, and the
//! filter evaluator that backs its `list_*` operations.
//!
//! # Features
//!
//! - **Shared state** - Clones share one set of collections behind an async-aware RwLock
//! - **Resolution on read** - Todos come back with copies of their labels
//! - **Filtering** - Filter specifications are compiled into pure [`Predicate`]s
//! - **Simulated latency** - Every operation awaits a configurable delay
//!
//! # Quick Start
//!
//! ```ignore
//! use mockend_memory::InMemoryStore;
//! use mockend_core::{backend::StoreBackend, record::TodoInput};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryStore::builder().no_latency().build();
//!     let todo = store.create_todo(TodoInput::new("Wax Ventricals")).await.unwrap();
//!
//!     assert_eq!(store.get_todo(&todo.id).await.unwrap(), Some(todo));
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mockend_memory;

pub mod evaluator;
pub mod store;

pub use evaluator::Predicate;
pub use store::{InMemoryStore, InMemoryStoreBuilder, Seed};
