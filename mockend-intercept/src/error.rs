//! Error types for routing and request interception.

use mockend_core::error::StoreError;
use thiserror::Error;

/// A route template could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// A failure while handling an intercepted request.
///
/// When a handler fails no response envelope is produced; the error is handed to
/// the caller of [`Interceptor::intercept`](crate::Interceptor::intercept) as-is.
#[derive(Error, Debug)]
pub enum InterceptError {
    /// The store or facade rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The response envelope could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    /// The response could not be assembled.
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
    /// The default routes could not be registered.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// A specialized `Result` type for interception.
pub type InterceptResult<T> = Result<T, InterceptError>;
