//! Binding matched routes to store operations.
//!
//! # Data Flow
//! ```text
//! path + request
//!     → Router::find (first matching template, ordered params)
//!     → Handler::call
//!         GET    without id → list
//!         GET    with id    → get
//!         DELETE with id    → delete
//!         other  without id → parse body, create  (201)
//!         other  with id    → parse body, update  (200)
//!     → { "data": ... } envelope
//! ```
//!
//! Whether a write is a create or an update depends only on the presence of the id
//! path parameter. On update the path id wins over an `id` in the body.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use http::{Method, Request, Response, StatusCode, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};

use mockend_core::{
    api::Api,
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    record::{Label, LabelInput, LabelPatch, Todo, TodoInput, TodoPatch},
};

use crate::{
    error::InterceptResult,
    intercept::Interception,
    router::{Params, Router},
};

/// The response body shape: the result, or `null`, under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Serializes `data` into an envelope response with the given status.
pub fn respond<T: Serialize>(data: T, status: StatusCode) -> InterceptResult<Response<Vec<u8>>> {
    let body = serde_json::to_vec(&Envelope { data })?;

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body)?)
}

/// Handles requests routed to one template.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles a routed request. `params` holds the template's parameters in declaration order.
    async fn call(&self, params: Params, request: Request<Vec<u8>>) -> InterceptResult<Response<Vec<u8>>>;
}

/// The store operations behind one REST-like resource.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resolved record returned to callers.
    type Record: Serialize + Send;
    /// The body accepted for creation.
    type Input: DeserializeOwned + Send;
    /// The body accepted for updates.
    type Patch: DeserializeOwned + Send;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Returns every record.
    async fn list(&self) -> StoreResult<Vec<Self::Record>>;
    /// Returns the record with the given id, if any.
    async fn get(&self, id: &str) -> StoreResult<Option<Self::Record>>;
    /// Creates a record.
    async fn create(&self, input: Self::Input) -> StoreResult<Self::Record>;
    /// Updates the record with the given id.
    async fn update(&self, id: &str, patch: Self::Patch) -> StoreResult<Self::Record>;
    /// Deletes the record with the given id and returns the id.
    async fn delete(&self, id: &str) -> StoreResult<String>;
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(body).map_err(|err| StoreError::MalformedInput(err.to_string()))
}

/// Adapts a [`Resource`] to the [`Handler`] interface using the first path parameter as its id.
pub struct ResourceHandler<R>(pub R);

#[async_trait]
impl<R: Resource> Handler for ResourceHandler<R> {
    async fn call(&self, params: Params, request: Request<Vec<u8>>) -> InterceptResult<Response<Vec<u8>>> {
        let resource = &self.0;
        let id = params.nth(0);
        tracing::debug!(resource = resource.name(), method = %request.method(), id = ?id, "Dispatching");

        match (request.method(), id) {
            (&Method::GET, None) => respond(resource.list().await?, StatusCode::OK),
            (&Method::GET, Some(id)) => respond(resource.get(id).await?, StatusCode::OK),
            (&Method::DELETE, Some(id)) => respond(resource.delete(id).await?, StatusCode::OK),
            (&Method::DELETE, None) => Err(StoreError::InvalidArgument(format!(
                "{} id is required for delete",
                resource.name()
            ))
            .into()),
            (_, None) => {
                let input = parse_body(request.body())?;
                respond(resource.create(input).await?, StatusCode::CREATED)
            }
            (_, Some(id)) => {
                let patch = parse_body(request.body())?;
                respond(resource.update(id, patch).await?, StatusCode::OK)
            }
        }
    }
}

/// The `/labels` resource.
pub struct Labels<B: StoreBackend>(pub Arc<Api<B>>);

#[async_trait]
impl<B: StoreBackend> Resource for Labels<B> {
    type Record = Label;
    type Input = LabelInput;
    type Patch = LabelPatch;

    fn name(&self) -> &'static str {
        "Label"
    }

    async fn list(&self) -> StoreResult<Vec<Label>> {
        self.0.list_labels(None).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Label>> {
        self.0.get_label(id).await
    }

    async fn create(&self, input: LabelInput) -> StoreResult<Label> {
        self.0.create_label(input).await
    }

    async fn update(&self, id: &str, patch: LabelPatch) -> StoreResult<Label> {
        self.0.update_label(id, patch).await
    }

    async fn delete(&self, id: &str) -> StoreResult<String> {
        self.0.delete_label(id).await
    }
}

/// The `/todos` resource.
pub struct Todos<B: StoreBackend>(pub Arc<Api<B>>);

#[async_trait]
impl<B: StoreBackend> Resource for Todos<B> {
    type Record = Todo;
    type Input = TodoInput;
    type Patch = TodoPatch;

    fn name(&self) -> &'static str {
        "Todo"
    }

    async fn list(&self) -> StoreResult<Vec<Todo>> {
        self.0.list_todos(None).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Todo>> {
        self.0.get_todo(id).await
    }

    async fn create(&self, input: TodoInput) -> StoreResult<Todo> {
        self.0.create_todo(input).await
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> StoreResult<Todo> {
        self.0.update_todo(id, patch).await
    }

    async fn delete(&self, id: &str) -> StoreResult<String> {
        self.0.delete_todo(id).await
    }
}

/// Routes prefix-stripped paths to their handlers.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router<Arc<dyn Handler>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "routes",
                &self
                    .router
                    .routes()
                    .iter()
                    .map(|route| route.template().as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over a custom router.
    pub fn new(router: Router<Arc<dyn Handler>>) -> Self {
        Dispatcher { router }
    }

    /// Creates a dispatcher with the standard resources, tried in this order:
    /// `/labels/:id?` then `/todos/:id?`.
    pub fn for_api<B: StoreBackend + 'static>(api: Arc<Api<B>>) -> InterceptResult<Self> {
        let labels: Arc<dyn Handler> = Arc::new(ResourceHandler(Labels(api.clone())));
        let todos: Arc<dyn Handler> = Arc::new(ResourceHandler(Todos(api)));

        let router = Router::new()
            .route("/labels/:id?", labels)?
            .route("/todos/:id?", todos)?;

        Ok(Dispatcher::new(router))
    }

    /// Dispatches a request whose prefix-stripped path is `path`.
    ///
    /// Unmatched requests are handed back as [`Interception::Passthrough`].
    pub async fn dispatch(&self, path: &str, request: Request<Vec<u8>>) -> InterceptResult<Interception> {
        let Some(found) = self.router.find(path) else {
            return Ok(Interception::Passthrough(request));
        };

        let response = found
            .route
            .handler()
            .call(found.params, request)
            .await?;

        Ok(Interception::Handled(response))
    }
}
