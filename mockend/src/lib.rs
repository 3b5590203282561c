//! An in-memory mock backend for Todos and Labels.
//!
//! This crate is the primary entry point of the mockend project. It re-exports the
//! core types and the in-memory backend, and wires them to a request interceptor
//! that answers for a fake API host.
//!
//! # Features
//!
//! - **Typed records** - Labels and Todos with normalized storage and resolved reads
//! - **Declarative filters** - Field conditions compiled into pure predicates
//! - **Intercepted HTTP** - `/labels/:id?` and `/todos/:id?` behind `api.todos.com/api/v1`
//! - **Simulated latency** - Every store operation awaits a configurable delay
//!
//! # Quick Start
//!
//! ```ignore
//! use mockend::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = Mockend::builder().sample_data().build().unwrap();
//!
//!     // In-process, with a filter
//!     let done = mock
//!         .api()
//!         .list_todos(Some(&FilterSpec::new().literal("completed", true)))
//!         .await
//!         .unwrap();
//!     println!("{} todos done", done.len());
//!
//!     // Through the intercepted boundary
//!     let request = http::Request::get("https://api.todos.com/api/v1/todos")
//!         .body(Vec::new())
//!         .unwrap();
//!     let response = mock.fetch(request).await.unwrap().into_response().unwrap();
//!     assert_eq!(response.status(), 200);
//! }
//! ```
//!
//! # Concurrency
//!
//! Store operations suspend for the configured latency before they complete and
//! nothing serializes writes to the same record across that suspension. When two
//! updates to one todo overlap, the one whose delay resolves last wins.

pub mod fixtures;
pub mod mock;
pub mod prelude;

pub use mockend_core::{api, backend, error, ident, latency, query, record, timestamp};
pub use mockend_intercept as intercept;

pub use fixtures::Fixtures;
pub use mock::{Mockend, MockendBuilder};

// Re-export BSON types for building filter operands
pub use bson;
pub use http;

/// In-memory storage backend implementations.
pub mod memory {
    pub use mockend_memory::{InMemoryStore, InMemoryStoreBuilder, Predicate, Seed};
}
