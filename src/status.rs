//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use trellis::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/users/42")
//!     .json(br#"{"id":42}"#.to_vec());
//!
//! async fn delete_user(_req: trellis::Request) -> Status {
//!     Status::NoContent
//! }
//! ```

/// The status codes a REST or GraphQL handler realistically answers with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    Accepted,             // 202
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,     // 301
    Found,                // 302
    SeeOther,             // 303
    NotModified,          // 304

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Conflict,             // 409
    UnsupportedMediaType, // 415
    UnprocessableContent, // 422
    TooManyRequests,      // 429

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    BadGateway,           // 502
    ServiceUnavailable,   // 503
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                   => 200,
            Status::Created              => 201,
            Status::Accepted             => 202,
            Status::NoContent            => 204,
            Status::MovedPermanently     => 301,
            Status::Found                => 302,
            Status::SeeOther             => 303,
            Status::NotModified          => 304,
            Status::BadRequest           => 400,
            Status::Unauthorized         => 401,
            Status::Forbidden            => 403,
            Status::NotFound             => 404,
            Status::MethodNotAllowed     => 405,
            Status::Conflict             => 409,
            Status::UnsupportedMediaType => 415,
            Status::UnprocessableContent => 422,
            Status::TooManyRequests      => 429,
            Status::InternalServerError  => 500,
            Status::NotImplemented       => 501,
            Status::BadGateway           => 502,
            Status::ServiceUnavailable   => 503,
        }
    }
}
