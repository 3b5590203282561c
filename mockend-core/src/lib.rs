//! Core types for an in-memory mock backend serving Todos and Labels.
//!
//! This crate is the core of the mockend project and provides:
//!
//! - **Records** ([`record`]) - Labels and Todos in their input, patch, normalized and resolved forms
//! - **Store backend abstraction** ([`backend`]) - The async trait backends implement
//! - **Filtering API** ([`query`]) - Declarative filter specifications and their expression tree
//! - **Facade** ([`api`]) - Validating entry point over a backend
//! - **Error handling** ([`error`]) - Error and result types
//! - **Latency and identifiers** ([`latency`], [`ident`]) - The seams for simulated I/O delay and id generation
//! - **Timestamps** ([`timestamp`]) - Instant parsing and ISO-8601 serde helpers

#[allow(unused_extern_crates)]
extern crate self as mockend_core;

pub mod api;
pub mod backend;
pub mod error;
pub mod ident;
pub mod latency;
pub mod query;
pub mod record;
pub mod timestamp;
