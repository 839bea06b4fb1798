//! # trellis
//!
//! A small HTTP bootstrap: a REST router, a GraphQL endpoint and one error
//! policy, served by hyper behind a tower middleware stack.
//!
//! ## The error contract
//!
//! Handlers and resolvers fail with [`AppError`]. The tag is chosen where the
//! error is raised, and classification only reads it:
//!
//! - [`AppError::Client`] → `400 {"error": {"message", "code"?, "details"?}}`
//! - [`AppError::Unexpected`] or a panic → `500 {"error":"Internal Server Error"}`
//!
//! Nothing internal reaches the client. Unexpected errors are logged with
//! their source instead.
//!
//! ## Request pipeline
//!
//! - Per-request tracing span and CORS, as tower layers
//! - Body collection and JSON parsing (malformed JSON is a generic 500)
//! - Radix-tree routing via [`matchit`], with the GraphQL endpoint mounted
//!   as an ordinary route
//! - Error classification, always last
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{App, AppError, ApplicationError, Json, Request, Router, Server};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), trellis::Error> {
//!     let router = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users", create_user);
//!
//!     Server::bind("0.0.0.0:4000").serve(App::new(router)).await
//! }
//!
//! async fn get_user(req: Request) -> Json<serde_json::Value> {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Json(serde_json::json!({ "id": id }))
//! }
//!
//! async fn create_user(req: Request) -> Result<Json<serde_json::Value>, AppError> {
//!     let body: serde_json::Value = req.json()?;
//!     if body.get("email").and_then(|v| v.as_str()).is_none() {
//!         return Err(ApplicationError::new("invalid email").into());
//!     }
//!     Ok(Json(body))
//! }
//! ```

mod app;
mod app_error;
mod config;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod graphql;
pub mod health;
pub mod middleware;

pub use app::App;
pub use app_error::{AppError, ApplicationError, BoxError, INTERNAL_SERVER_ERROR, ResultExt};
pub use config::{Config, LogFormat};
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use middleware::cors::CorsConfig;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
