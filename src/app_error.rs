//! Request-level errors and their classification tag.
//!
//! Every failure a handler or resolver reports is an [`AppError`], and its
//! variant is fixed when the error is built:
//!
//! - [`AppError::Client`] wraps an [`ApplicationError`]. The client caused it
//!   (bad input, a broken business rule) and sees it in full.
//! - [`AppError::Unexpected`] wraps anything else. The client sees only
//!   `Internal Server Error`; the source is kept for the server log.
//!
//! ```rust
//! use trellis::{AppError, ApplicationError};
//!
//! let fault: AppError = ApplicationError::new("invalid email").into();
//! assert!(fault.is_client());
//!
//! let oops = AppError::unexpected(std::io::Error::other("disk on fire"));
//! assert_eq!(oops.to_string(), "Internal Server Error");
//! ```

use serde::Serialize;
use serde_json::Value;

/// Boxed source of an unexpected error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Text shown to clients in place of any unexpected error.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// A client-attributable failure.
///
/// The whole value is serialized into the response body, so never put
/// internal state (SQL, paths, secrets) in `message` or `details`.
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApplicationError {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: None, details: None }
    }

    /// Attach a stable machine-readable code, e.g. `"invalid_email"`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach structured details, e.g. `{"field": "email"}`.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn message(&self) -> &str { &self.message }
    pub fn code(&self) -> Option<&str> { self.code.as_deref() }
    pub fn details(&self) -> Option<&Value> { self.details.as_ref() }
}

/// A request failure, tagged client-fault or unexpected at construction.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ApplicationError),

    // Display stays fixed so formatting this variant can never leak the source.
    #[error("Internal Server Error")]
    Unexpected(#[source] BoxError),
}

impl AppError {
    /// Shorthand for `ApplicationError::new(message).into()`.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(ApplicationError::new(message))
    }

    pub fn unexpected(source: impl Into<BoxError>) -> Self {
        Self::Unexpected(source.into())
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::unexpected(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::unexpected(e)
    }
}

/// Tag arbitrary `Result` errors with a classification.
///
/// ```rust
/// use trellis::ResultExt;
///
/// fn port(raw: &str) -> Result<u16, trellis::AppError> {
///     raw.parse::<u16>().client_fault("port must be a number")
/// }
/// assert!(port("http").is_err());
/// ```
pub trait ResultExt<T> {
    /// Treat any error as unexpected, keeping it as the source.
    fn or_unexpected(self) -> Result<T, AppError>;

    /// Replace any error with a client fault carrying `message`.
    fn client_fault(self, message: &str) -> Result<T, AppError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn or_unexpected(self) -> Result<T, AppError> {
        self.map_err(AppError::unexpected)
    }

    fn client_fault(self, message: &str) -> Result<T, AppError> {
        self.map_err(|_| AppError::client(message))
    }
}
