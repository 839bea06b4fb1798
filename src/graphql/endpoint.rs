//! GraphQL over HTTP.
//!
//! | request | outcome |
//! |---|---|
//! | `POST` JSON `{query, variables?, operationName?}` | execute |
//! | `POST` `application/graphql` raw query | execute |
//! | `POST` `application/x-www-form-urlencoded` | execute |
//! | `GET ?query=...` | execute, queries only (mutations get 405) |
//! | `GET` without `query` | GraphiQL page, when enabled |
//!
//! `query`, `operationName` and `variables` in the URL take precedence over
//! the same keys in a `POST` body.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_graphql::Variables;
use async_graphql::dynamic::Schema;
use async_graphql::http::GraphiQLSource;
use async_graphql::parser::parse_query;
use async_graphql::parser::types::{DocumentOperations, OperationType};
use futures_util::FutureExt;

use super::format::{executed, rejection};
use crate::app_error::INTERNAL_SERVER_ERROR;
use crate::middleware::classify;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::router::Router;
use crate::status::Status;

/// Default mount path.
pub const DEFAULT_PATH: &str = "/graphql";

const MISSING_QUERY: &str = "Must provide query string.";
const MUTATION_OVER_GET: &str = "Can only perform a mutation operation from a POST request.";
const INVALID_VARIABLES: &str = "Variables are invalid JSON.";

type ContextFn = Arc<dyn Fn(&Request, async_graphql::Request) -> async_graphql::Request + Send + Sync>;

/// Serves an executable schema on one path.
///
/// ```rust,no_run
/// # fn schema() -> async_graphql::dynamic::Schema { unimplemented!() }
/// # struct Db;
/// # impl Db { fn connect() -> Self { Db } }
/// use trellis::Router;
/// use trellis::graphql::GraphQlEndpoint;
///
/// let router = GraphQlEndpoint::new(schema())
///     .context(|_req| Db::connect())
///     .mount(Router::new());
/// ```
#[derive(Clone)]
pub struct GraphQlEndpoint {
    schema: Schema,
    path: String,
    graphiql: bool,
    context: Option<ContextFn>,
}

impl GraphQlEndpoint {
    pub fn new(schema: Schema) -> Self {
        Self { schema, path: DEFAULT_PATH.to_owned(), graphiql: true, context: None }
    }

    /// Mounts on `path` instead of `/graphql`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Serves GraphiQL on a bare `GET`. On by default.
    pub fn graphiql(mut self, enabled: bool) -> Self {
        self.graphiql = enabled;
        self
    }

    /// Builds a per-request context value; resolvers read it with
    /// `ctx.ctx.data::<C>()`.
    pub fn context<C, F>(mut self, provider: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(&Request) -> C + Send + Sync + 'static,
    {
        self.context = Some(Arc::new(move |req: &Request, gql: async_graphql::Request| {
            gql.data(provider(req))
        }));
        self
    }

    /// Registers `GET` and `POST` handlers for this endpoint on `router`.
    pub fn mount(self, router: Router) -> Router {
        let endpoint = Arc::new(self);
        let path = endpoint.path.clone();
        let on_get = Arc::clone(&endpoint);
        let on_post = endpoint;

        router
            .get(&path, move |req: Request| {
                let endpoint = Arc::clone(&on_get);
                async move { endpoint.get(req).await }
            })
            .post(&path, move |req: Request| {
                let endpoint = Arc::clone(&on_post);
                async move { endpoint.post(req).await }
            })
    }

    async fn get(&self, req: Request) -> Response {
        let params = match url_params(req.query().unwrap_or("")) {
            Ok(params) => params,
            Err(e) => return rejection(Status::BadRequest, &[e.as_str()]),
        };
        if !params.iter().any(|(key, _)| key == "query") {
            return if self.graphiql {
                let page = GraphiQLSource::build().endpoint(&self.path).finish();
                Response::builder().bytes(ContentType::Html, page.into_bytes())
            } else {
                rejection(Status::BadRequest, &[MISSING_QUERY])
            };
        }

        match apply_params(async_graphql::Request::new(""), params) {
            Ok(gql) => self.execute(&req, gql, false).await,
            Err(e) => rejection(Status::BadRequest, &[e.as_str()]),
        }
    }

    async fn post(&self, req: Request) -> Response {
        let gql = body_params(&req).and_then(|gql| {
            let params = url_params(req.query().unwrap_or(""))?;
            apply_params(gql, params)
        });
        match gql {
            Ok(gql) => self.execute(&req, gql, true).await,
            Err(e) => rejection(Status::BadRequest, &[e.as_str()]),
        }
    }

    async fn execute(&self, req: &Request, gql: async_graphql::Request, allow_mutation: bool) -> Response {
        if gql.query.trim().is_empty() {
            return rejection(Status::BadRequest, &[MISSING_QUERY]);
        }

        let doc = match parse_query(&gql.query) {
            Ok(doc) => doc,
            Err(e) => return rejection(Status::BadRequest, &[e.to_string().as_str()]),
        };
        if !allow_mutation {
            let op = match &doc.operations {
                DocumentOperations::Single(op) => Some(op),
                DocumentOperations::Multiple(ops) => {
                    gql.operation_name.as_deref().and_then(|name| ops.get(name))
                }
            };
            if op.is_some_and(|op| op.node.ty == OperationType::Mutation) {
                return Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", "POST")
                    .json_value(&serde_json::json!({ "errors": [{ "message": MUTATION_OVER_GET }] }));
            }
        }

        let gql = match &self.context {
            Some(provide) => provide(req, gql),
            None => gql,
        };

        match AssertUnwindSafe(self.schema.execute(gql)).catch_unwind().await {
            Ok(response) => executed(response),
            Err(payload) => {
                let err = classify::from_panic(payload);
                tracing::error!(error = ?err, "resolver panicked");
                rejection(Status::InternalServerError, &[INTERNAL_SERVER_ERROR])
            }
        }
    }
}

/// Reads the GraphQL parameters a `POST` body carries, by media type.
fn body_params(req: &Request) -> Result<async_graphql::Request, String> {
    let mime = req.header("content-type")
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase());

    match mime.as_deref() {
        Some("application/graphql") => {
            Ok(async_graphql::Request::new(String::from_utf8_lossy(req.body())))
        }
        Some("application/x-www-form-urlencoded") => {
            let form = url_params(&String::from_utf8_lossy(req.body()))?;
            apply_params(async_graphql::Request::new(""), form)
        }
        _ => match req.json_value() {
            Some(body) => serde_json::from_value(body.clone())
                .map_err(|e| format!("invalid GraphQL request: {e}")),
            None => Ok(async_graphql::Request::new("")),
        },
    }
}

/// Decodes an `application/x-www-form-urlencoded` string into key/value pairs.
fn url_params(encoded: &str) -> Result<Vec<(String, String)>, String> {
    serde_urlencoded::from_str(encoded).map_err(|e| format!("invalid query string: {e}"))
}

/// Overrides `gql` with any `query`, `operationName` or `variables` in `params`.
fn apply_params(
    mut gql: async_graphql::Request,
    params: Vec<(String, String)>,
) -> Result<async_graphql::Request, String> {
    for (key, value) in params {
        match key.as_str() {
            "query" => gql.query = value,
            "operationName" => gql.operation_name = Some(value),
            "variables" => {
                let json: serde_json::Value = serde_json::from_str(&value)
                    .map_err(|_| INVALID_VARIABLES.to_owned())?;
                gql.variables = Variables::from_json(json);
            }
            _ => {}
        }
    }
    Ok(gql)
}
