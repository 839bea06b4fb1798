//! Client-facing shape of GraphQL results.
//!
//! Each error is reduced to `{"message": ...}`. Locations, paths and
//! extensions are dropped, and the generic wrapping prefix some executors put
//! in front of non-error throw values is stripped.

use async_graphql::{Response as GqlResponse, ServerError, Value};
use serde::Serialize;

use super::resolver::is_resolver_fault;
use crate::app_error::AppError;
use crate::response::Response;
use crate::status::Status;

/// Prefix an executor adds when the thrown value was not an error object.
pub const UNEXPECTED_PREFIX: &str = "Unexpected error value: ";

/// One entry of the `errors` array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Strips [`UNEXPECTED_PREFIX`] from `message` if present.
pub fn format_error(message: &str) -> ErrorMessage {
    let message = message.strip_prefix(UNEXPECTED_PREFIX).unwrap_or(message);
    ErrorMessage { message: message.to_owned() }
}

#[derive(Serialize)]
struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ErrorMessage>,
}

/// A response carrying only `errors`, for requests rejected before execution.
pub(crate) fn rejection(status: Status, messages: &[&str]) -> Response {
    let envelope = Envelope {
        data: None,
        errors: messages.iter().map(|m| format_error(m)).collect(),
    };
    Response::builder().status(status).json_value(&envelope)
}

/// Shapes an executed response.
///
/// `data: null` with only validation errors is a 400 and omits `data`;
/// `data: null` with a resolver failure is a 500; everything else is a 200,
/// partial results included.
pub(crate) fn executed(response: GqlResponse) -> Response {
    for err in &response.errors {
        log_if_unexpected(err);
    }

    let failed = matches!(response.data, Value::Null) && !response.errors.is_empty();
    let validation = failed && !response.errors.iter().any(is_resolver_fault);

    let status = match (failed, validation) {
        (true, true) => Status::BadRequest,
        (true, false) => Status::InternalServerError,
        _ => Status::Ok,
    };
    let envelope = Envelope {
        data: (!validation).then_some(response.data),
        errors: response.errors.iter().map(|e| format_error(&e.message)).collect(),
    };
    Response::builder().status(status).json_value(&envelope)
}

fn log_if_unexpected(err: &ServerError) {
    if let Some(AppError::Unexpected(source)) = err.source::<AppError>() {
        tracing::error!(error = %source, path = ?err.path, "resolver failed");
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::{PathSegment, Pos};
    use pretty_assertions::assert_eq;
    use serde_json::{Value as Json, json};

    use super::*;
    use crate::graphql::resolver::RESOLVER_FAULT;

    fn body(res: &Response) -> Json {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn strips_wrapping_prefix() {
        assert_eq!(format_error("Unexpected error value: boom").message, "boom");
        assert_eq!(
            serde_json::to_value(format_error("Unexpected error value: boom")).unwrap(),
            json!({ "message": "boom" }),
        );
    }

    #[test]
    fn unrelated_messages_pass_through() {
        assert_eq!(format_error("totally unrelated failure").message, "totally unrelated failure");
        // Only a leading prefix counts.
        assert_eq!(
            format_error("wrapped: Unexpected error value: boom").message,
            "wrapped: Unexpected error value: boom",
        );
    }

    #[test]
    fn successful_data_is_200_without_errors() {
        let res = executed(GqlResponse::new(Value::from_json(json!({ "ping": "pong" })).unwrap()));
        assert_eq!(res.status_code(), 200);
        assert_eq!(body(&res), json!({ "data": { "ping": "pong" } }));
    }

    #[test]
    fn validation_failure_is_400_without_data() {
        let err = ServerError::new("Unknown field \"nope\" on type \"Query\".", Some(Pos { line: 1, column: 3 }));
        let res = executed(GqlResponse::from_errors(vec![err]));

        assert_eq!(res.status_code(), 400);
        assert_eq!(body(&res), json!({ "errors": [{ "message": "Unknown field \"nope\" on type \"Query\"." }] }));
    }

    #[test]
    fn null_data_with_resolver_fault_is_500() {
        let mut err = ServerError::new("Unexpected error value: db down", Some(Pos { line: 1, column: 3 }));
        err.extensions.get_or_insert_with(Default::default).set(RESOLVER_FAULT, true);
        let res = executed(GqlResponse::from_errors(vec![err]));

        assert_eq!(res.status_code(), 500);
        assert_eq!(body(&res), json!({ "data": null, "errors": [{ "message": "db down" }] }));
    }

    #[test]
    fn partial_data_with_errors_is_200() {
        let mut err = ServerError::new("not signed in", Some(Pos { line: 1, column: 8 }));
        err.path = vec![PathSegment::Field("me".to_owned())];
        let mut res = GqlResponse::new(Value::from_json(json!({ "ping": "pong", "me": null })).unwrap());
        res.errors.push(err);
        let res = executed(res);

        assert_eq!(res.status_code(), 200);
        assert_eq!(
            body(&res),
            json!({ "data": { "ping": "pong", "me": null }, "errors": [{ "message": "not signed in" }] }),
        );
    }

    #[test]
    fn rejection_has_only_errors() {
        let res = rejection(Status::BadRequest, &["Must provide query string."]);
        assert_eq!(res.status_code(), 400);
        assert_eq!(body(&res), json!({ "errors": [{ "message": "Must provide query string." }] }));
    }
}
