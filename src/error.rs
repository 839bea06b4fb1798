//! Unified infrastructure error type.

use crate::graphql::SchemaError;

/// The error type returned by trellis's fallible startup operations.
///
/// Request-level failures are expressed as [`AppError`](crate::AppError)
/// values and turned into HTTP responses. This type surfaces infrastructure
/// failures: binding to a port, reading the schema, assembling it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot listen on `{addr}`: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
