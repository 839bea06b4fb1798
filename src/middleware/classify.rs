//! Terminal error classification.
//!
//! Every error that escapes a handler ends up here, whether it was returned
//! as `Err(AppError)` or raised as a panic. The mapping is a tag match:
//!
//! | error | status | body |
//! |---|---|---|
//! | `AppError::Client(e)` | 400 | `{"error": e}` |
//! | anything else | 500 | `{"error": "Internal Server Error"}` |
//!
//! This stage writes exactly one response and never forwards. It does not
//! log; the dispatcher records unexpected errors before calling it.

use std::any::Any;

use serde::Serialize;

use crate::app_error::{AppError, ApplicationError, INTERNAL_SERVER_ERROR};
use crate::response::Response;
use crate::status::Status;

#[derive(Serialize)]
struct ErrorBody<'a, E: Serialize> {
    error: &'a E,
}

/// Shapes `err` into its client-facing response.
pub fn error_response(err: &AppError) -> Response {
    match err {
        AppError::Client(e) => client_fault(e),
        AppError::Unexpected(_) => internal_error(),
    }
}

/// Converts a panic payload caught around a handler into an [`AppError`].
///
/// The payload text is kept as the unexpected source for logging only.
pub fn from_panic(payload: Box<dyn Any + Send>) -> AppError {
    let text = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned());
    AppError::unexpected(text)
}

fn client_fault(e: &ApplicationError) -> Response {
    match serde_json::to_vec(&ErrorBody { error: e }) {
        Ok(bytes) => Response::builder().status(Status::BadRequest).json(bytes),
        Err(_) => internal_error(),
    }
}

fn internal_error() -> Response {
    // Fixed text, so building it cannot fail.
    Response::builder()
        .status(Status::InternalServerError)
        .json(format!(r#"{{"error":"{INTERNAL_SERVER_ERROR}"}}"#).into_bytes())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;

    fn body(res: &Response) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn client_fault_is_400_with_full_error() {
        let err = ApplicationError::new("invalid email")
            .with_code("invalid_email")
            .with_details(json!({ "field": "email" }));
        let res = error_response(&err.clone().into());

        assert_eq!(res.status_code(), 400);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(body(&res), json!({ "error": serde_json::to_value(&err).unwrap() }));
    }

    #[test]
    fn every_unexpected_shape_is_the_same_500() {
        let errors = [
            AppError::unexpected(std::io::Error::other("socket closed")),
            AppError::unexpected("plain string"),
            AppError::unexpected(String::new()),
            from_panic(Box::new(())),
        ];

        for err in &errors {
            let res = error_response(err);
            assert_eq!(res.status_code(), 500);
            assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#);
        }
    }

    #[test]
    fn panic_payload_text_is_kept_as_source() {
        let err = from_panic(Box::new("called `Option::unwrap()` on a `None` value"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "called `Option::unwrap()` on a `None` value");

        let err = from_panic(Box::new(String::from("index out of bounds")));
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "index out of bounds");
    }
}
