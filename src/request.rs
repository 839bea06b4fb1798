//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::app_error::{AppError, ApplicationError};
use crate::method::Method;

/// An incoming HTTP request with its body fully collected.
///
/// A body sent with a JSON content type is parsed once, before routing. A
/// malformed one never reaches a handler and is answered like any other
/// unexpected error.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) json: Option<Value>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request from its head and collected body.
    ///
    /// Fails with an unexpected error when the content type announces JSON
    /// and the body does not parse. The parser's message stays server-side.
    pub(crate) fn new(
        method: Method,
        parts: http::request::Parts,
        body: Bytes,
    ) -> Result<Self, AppError> {
        let json = if is_json(&parts.headers) && !body.is_empty() {
            Some(serde_json::from_slice(&body).map_err(AppError::unexpected)?)
        } else {
            None
        };

        Ok(Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            json,
            params: HashMap::new(),
        })
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The parsed JSON body, if the request carried one.
    pub fn json_value(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Deserialises the JSON body into `T`.
    ///
    /// A missing body or a shape mismatch is a client fault (code
    /// `invalid_body`), so handlers can use `?` directly.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let value = self.json.clone().ok_or_else(|| {
            ApplicationError::new("request body must be JSON").with_code("invalid_body")
        })?;
        serde_json::from_value(value).map_err(|e| {
            ApplicationError::new(format!("invalid request body: {e}"))
                .with_code("invalid_body")
                .into()
        })
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    fn request(content_type: Option<&str>, body: &'static [u8]) -> Result<Request, AppError> {
        let mut builder = http::Request::post("/users?page=2");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(Method::Post, parts, Bytes::from_static(body))
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NewUser {
        email: String,
    }

    #[test]
    fn json_body_is_parsed_up_front() {
        let req = request(Some("application/json; charset=utf-8"), br#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query(), Some("page=2"));
        assert_eq!(req.json::<NewUser>().unwrap(), NewUser { email: "a@b.c".to_owned() });
    }

    #[test]
    fn malformed_json_is_unexpected() {
        let Err(err) = request(Some("application/json"), b"{nope") else {
            panic!("expected malformed JSON to fail");
        };
        assert!(!err.is_client());
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn other_content_types_are_left_alone() {
        let req = request(Some("text/plain"), b"{nope").unwrap();
        assert!(req.json_value().is_none());
        assert_eq!(req.body(), b"{nope");
    }

    #[test]
    fn shape_mismatch_is_a_client_fault() {
        let req = request(Some("application/json"), br#"{"name":"x"}"#).unwrap();
        let err = req.json::<NewUser>().unwrap_err();
        assert!(err.is_client());

        let req = request(None, b"").unwrap();
        let Err(AppError::Client(e)) = req.json::<NewUser>() else {
            panic!("expected a client fault");
        };
        assert_eq!(e.code(), Some("invalid_body"));
    }
}
