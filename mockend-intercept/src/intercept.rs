//! The request-interception boundary.
//!
//! Only requests addressed to the configured host and carrying the configured
//! path prefix are considered. Everything else, and every request no route
//! matches, is handed back untouched so the caller can fall back to its default
//! network behavior.

use std::sync::Arc;

use http::{Request, Response, header::HOST};
use serde::{Deserialize, Serialize};

use mockend_core::{api::Api, backend::StoreBackend};

use crate::{dispatch::Dispatcher, error::InterceptResult};

/// Host and prefix the interceptor answers for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterceptConfig {
    /// Requests are intercepted only when their host matches this value (ASCII case-insensitive).
    pub host: String,
    /// Literal prefix stripped from the path before routing.
    pub prefix: String,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        InterceptConfig {
            host: "api.todos.com".to_string(),
            prefix: "/api/v1".to_string(),
        }
    }
}

/// What the interceptor did with a request.
#[derive(Debug)]
pub enum Interception {
    /// A route handled the request.
    Handled(Response<Vec<u8>>),
    /// The request was not for us; it is returned unchanged.
    Passthrough(Request<Vec<u8>>),
}

impl Interception {
    /// Returns the response if the request was handled.
    pub fn into_response(self) -> Option<Response<Vec<u8>>> {
        match self {
            Interception::Handled(response) => Some(response),
            Interception::Passthrough(_) => None,
        }
    }

    /// Returns true if a route handled the request.
    pub fn is_handled(&self) -> bool {
        matches!(self, Interception::Handled(_))
    }
}

/// Checks host and prefix, then hands matching requests to a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct Interceptor {
    config: InterceptConfig,
    dispatcher: Dispatcher,
}

impl Interceptor {
    /// Creates an interceptor answering for `config` with the given dispatcher.
    pub fn new(config: InterceptConfig, dispatcher: Dispatcher) -> Self {
        Interceptor { config, dispatcher }
    }

    /// Creates an interceptor serving the standard `/labels` and `/todos` resources.
    pub fn for_api<B: StoreBackend + 'static>(
        config: InterceptConfig,
        api: Arc<Api<B>>,
    ) -> InterceptResult<Self> {
        Ok(Interceptor::new(config, Dispatcher::for_api(api)?))
    }

    /// Returns the host and prefix this interceptor answers for.
    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    /// Intercepts a request.
    ///
    /// # Errors
    ///
    /// Returns the handler's error when a matched handler fails. No envelope is
    /// produced in that case.
    pub async fn intercept(&self, request: Request<Vec<u8>>) -> InterceptResult<Interception> {
        if !self.is_target_host(&request) {
            return Ok(Interception::Passthrough(request));
        }

        let path = request.uri().path().to_string();
        let Some(resource) = path.strip_prefix(self.config.prefix.as_str()) else {
            return Ok(Interception::Passthrough(request));
        };

        let method = request.method().clone();
        let result = self.dispatcher.dispatch(resource, request).await;

        match &result {
            Ok(Interception::Handled(response)) => {
                tracing::debug!(method = %method, path = %path, status = %response.status(), "Request intercepted")
            }
            Ok(Interception::Passthrough(_)) => {
                tracing::debug!(method = %method, path = %path, "No route matched, passing through")
            }
            Err(err) => tracing::warn!(method = %method, path = %path, error = %err, "Handler failed"),
        }

        result
    }

    fn is_target_host(&self, request: &Request<Vec<u8>>) -> bool {
        let host = request.uri().host().or_else(|| {
            request
                .headers()
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(':').next().unwrap_or(value))
        });

        host.is_some_and(|host| host.eq_ignore_ascii_case(&self.config.host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use mockend_core::error::StoreError;
    use mockend_memory::InMemoryStore;
    use serde_json::{Value, json};

    use crate::error::InterceptError;

    fn interceptor() -> Interceptor {
        let api = Arc::new(Api::new(InMemoryStore::builder().no_latency().build()));
        Interceptor::for_api(InterceptConfig::default(), api).unwrap()
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Vec<u8>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.map(|body| serde_json::to_vec(&body).unwrap()).unwrap_or_default())
            .unwrap()
    }

    async fn send(interceptor: &Interceptor, request: Request<Vec<u8>>) -> (StatusCode, Value) {
        let response = interceptor
            .intercept(request)
            .await
            .unwrap()
            .into_response()
            .expect("request should be intercepted");

        (response.status(), serde_json::from_slice(response.body()).unwrap())
    }

    #[tokio::test]
    async fn create_then_read_labels() {
        let interceptor = interceptor();

        let (status, created) = send(
            &interceptor,
            request(Method::POST, "https://api.todos.com/api/v1/labels/", Some(json!({ "title": "Bug" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["title"], "Bug");
        assert_eq!(created["data"]["color"], Value::Null);

        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(
            &interceptor,
            request(Method::GET, &format!("https://api.todos.com/api/v1/labels/{id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (_, listed) = send(&interceptor, request(Method::GET, "https://api.todos.com/api/v1/labels", None)).await;
        assert_eq!(listed, json!({ "data": [created["data"].clone()] }));
    }

    #[tokio::test]
    async fn id_parameter_selects_update() {
        let interceptor = interceptor();

        let (_, created) = send(
            &interceptor,
            request(Method::POST, "https://api.todos.com/api/v1/todos", Some(json!({ "title": "A", "completed": false }))),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["completedAt"], Value::Null);

        let (status, updated) = send(
            &interceptor,
            request(
                Method::PUT,
                &format!("https://api.todos.com/api/v1/todos/{id}"),
                Some(json!({ "completed": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["title"], "A");
        assert!(updated["data"]["completedAt"].is_string());
    }

    #[tokio::test]
    async fn missing_records_come_back_as_null_data() {
        let interceptor = interceptor();

        let (status, body) = send(&interceptor, request(Method::GET, "https://api.todos.com/api/v1/todos/nope", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": null }));
    }

    #[tokio::test]
    async fn delete_returns_the_id() {
        let interceptor = interceptor();

        let (status, body) = send(&interceptor, request(Method::DELETE, "https://api.todos.com/api/v1/todos/t1", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": "t1" }));

        let err = interceptor
            .intercept(request(Method::DELETE, "https://api.todos.com/api/v1/todos", None))
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::Store(StoreError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn failures_propagate_without_an_envelope() {
        let interceptor = interceptor();

        let err = interceptor
            .intercept(request(Method::POST, "https://api.todos.com/api/v1/todos", Some(json!({ "completed": "yes" }))))
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::Store(StoreError::MalformedInput(_))));

        let err = interceptor
            .intercept(request(Method::PATCH, "https://api.todos.com/api/v1/todos/unknown", Some(json!({ "title": "x" }))))
            .await
            .unwrap_err();
        assert!(matches!(err, InterceptError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn foreign_hosts_and_paths_pass_through() {
        let interceptor = interceptor();

        for uri in [
            "https://example.com/api/v1/todos",
            "https://api.todos.com/other/todos",
            "https://api.todos.com/api/v1/projects",
        ] {
            let outcome = interceptor.intercept(request(Method::GET, uri, None)).await.unwrap();
            match outcome {
                Interception::Passthrough(request) => assert_eq!(request.uri(), uri),
                Interception::Handled(_) => panic!("{uri} should pass through"),
            }
        }
    }

    #[tokio::test]
    async fn host_header_is_used_for_relative_uris() {
        let interceptor = interceptor();

        let request = Request::builder()
            .uri("/api/v1/labels")
            .header(HOST, "API.todos.com:443")
            .body(Vec::new())
            .unwrap();

        assert!(interceptor.intercept(request).await.unwrap().is_handled());
    }
}
