//! Request interception and routing for mockend.
//!
//! # Data Flow
//! ```text
//! http::Request
//!     → intercept.rs (host check, prefix strip)
//!     → router.rs (first matching path template, ordered params)
//!     → dispatch.rs (verb + id → store operation)
//!     → http::Response with a { "data": ... } body, or the request handed back
//! ```

#[allow(unused_extern_crates)]
extern crate self as mockend_intercept;

pub mod dispatch;
pub mod error;
pub mod intercept;
pub mod router;

pub use dispatch::{Dispatcher, Envelope, Handler, Resource, ResourceHandler};
pub use error::{InterceptError, InterceptResult, RouteError};
pub use intercept::{InterceptConfig, Interception, Interceptor};
pub use router::{Params, PathTemplate, Router};
