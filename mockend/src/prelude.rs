//! Convenient re-exports of commonly used types from mockend.
//!
//! ```ignore
//! use mockend::prelude::*;
//! ```

pub use mockend_core::{
    api::Api,
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    ident::{IdGenerator, UuidGenerator},
    latency::{FixedLatency, Latency, NoLatency},
    query::{Condition, FilterSpec, Operator},
    record::{Label, LabelInput, LabelPatch, LabelRef, Record, RecordExt, Todo, TodoInput, TodoPatch},
};
pub use mockend_intercept::{InterceptConfig, InterceptError, InterceptResult, Interception, Interceptor};
pub use mockend_memory::{InMemoryStore, Predicate, Seed};

pub use crate::{fixtures::Fixtures, mock::{Mockend, MockendBuilder}};
