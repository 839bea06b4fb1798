//! The application context: everything a request needs, built once.

use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures_util::FutureExt;
use http_body::Body;
use http_body_util::BodyExt;
use tracing::{debug, error};

use crate::app_error::{AppError, ApplicationError};
use crate::method::Method;
use crate::middleware::{classify, cors::CorsConfig};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::status::Status;

/// The assembled application: router (with any GraphQL endpoint mounted on
/// it) and CORS settings.
///
/// Built once at startup, then shared immutably by every connection.
///
/// ```rust
/// use trellis::{App, Request, Response, Router};
///
/// async fn hello(_req: Request) -> Response { Response::text("hi") }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let app = App::new(Router::new().get("/", hello));
/// let res = app.handle(http::Request::get("/").body(String::new()).unwrap()).await;
/// assert_eq!(res.body(), b"hi");
/// # }
/// ```
pub struct App {
    router: Router,
    cors: CorsConfig,
}

impl App {
    pub fn new(router: Router) -> Self {
        Self { router, cors: CorsConfig::default() }
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    pub(crate) fn cors_config(&self) -> &CorsConfig {
        &self.cors
    }

    /// Runs one request through body parsing, routing, the handler, and
    /// error classification. Always produces exactly one response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let Ok(method) = parts.method.as_str().parse::<Method>() else {
            return Response::status(Status::MethodNotAllowed);
        };

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!("failed to read request body: {e}");
                return ApplicationError::new("failed to read request body")
                    .with_code("invalid_body")
                    .into_response();
            }
        };

        let req = match Request::new(method, parts, body) {
            Ok(req) => req,
            Err(e) => return e.into_response(),
        };

        let Some((handler, params)) = self.router.lookup(method, req.path()) else {
            return Response::status(Status::NotFound);
        };
        let req = req.with_params(params);

        // The call sits inside the async block so a panic while building the
        // handler future is caught too.
        match AssertUnwindSafe(async move { handler.call(req).await }).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => {
                let err = classify::from_panic(payload);
                error!(error = ?err, "handler panicked");
                classify::error_response(&err)
            }
        }
    }
}

/// Records an unexpected error on its way to the client as a generic 500.
pub(crate) fn log_unexpected(err: &AppError) {
    if let AppError::Unexpected(source) = err {
        error!(error = %source, "request failed");
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::Full;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn boom(_req: Request) -> Response {
        let missing: Option<&str> = None;
        Response::text(missing.unwrap())
    }

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or_default().to_owned())
    }

    fn get(uri: &str) -> http::Request<Full<Bytes>> {
        http::Request::get(uri).body(Full::default()).unwrap()
    }

    #[tokio::test]
    async fn routes_with_params() {
        let app = App::new(Router::new().get("/users/{id}", echo_id));
        let res = app.handle(get("/users/42")).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let app = App::new(Router::new());
        assert_eq!(app.handle(get("/nowhere")).await.status_code(), 404);
    }

    #[tokio::test]
    async fn unknown_method_is_405() {
        let app = App::new(Router::new());
        let req = http::Request::builder()
            .method("PROPFIND")
            .uri("/")
            .body(Full::default())
            .unwrap();
        assert_eq!(app.handle(req).await.status_code(), 405);
    }

    #[tokio::test]
    async fn panicking_handler_is_a_generic_500() {
        let app = App::new(Router::new().get("/boom", boom));
        let res = app.handle(get("/boom")).await;

        assert_eq!(res.status_code(), 500);
        assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#);
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_the_handler() {
        let app = App::new(Router::new().post("/users", boom));
        let req = http::Request::post("/users")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(b"{\"email\":")))
            .unwrap();
        let res = app.handle(req).await;

        assert_eq!(res.status_code(), 500);
        assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#);
    }
}
