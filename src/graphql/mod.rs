//! GraphQL endpoint: schema assembly, execution over HTTP, error shaping.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use trellis::Router;
//! use trellis::graphql::{GraphQlEndpoint, ResolverMap, schema};
//!
//! # fn resolvers() -> ResolverMap { ResolverMap::new() }
//! # fn main() -> Result<(), trellis::Error> {
//! let schema = schema::load(Path::new("schema/schema.graphql"), &resolvers())?;
//! let router = GraphQlEndpoint::new(schema).mount(Router::new());
//! # Ok(())
//! # }
//! ```
//!
//! Resolvers report failures as [`AppError`](crate::AppError). A client
//! fault reaches the client with its message; an unexpected error reaches it
//! as `Internal Server Error` and is logged with its source.

mod endpoint;
mod format;
mod resolver;
pub mod schema;
mod value;

pub use endpoint::{DEFAULT_PATH, GraphQlEndpoint};
pub use format::{ErrorMessage, UNEXPECTED_PREFIX, format_error};
pub use resolver::{Resolver, ResolverMap};
pub use schema::SchemaError;
pub use value::{TYPENAME_KEY, to_field_value};
