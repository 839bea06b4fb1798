//! Cross-origin resource sharing.
//!
//! The defaults answer every origin, like a stock `cors()` middleware:
//! `Access-Control-Allow-Origin: *`, the six common methods, and request
//! headers mirrored back on preflight. Preflight requests are answered here
//! and never reach a handler.

use http::header::HeaderName;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Methods advertised on preflight responses.
const DEFAULT_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// CORS settings.
#[derive(Clone, Debug, Default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub origins: Vec<String>,
    /// Extra headers the browser may read from responses.
    pub expose_headers: Vec<String>,
    /// Allow cookies and auth headers. Requires an explicit origin list.
    pub credentials: bool,
}

/// Builds the Tower CORS layer for `config`.
///
/// Unparseable origin or header names are dropped with a warning rather than
/// failing startup.
pub fn layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new()
        .allow_methods(DEFAULT_METHODS.to_vec())
        .allow_headers(AllowHeaders::mirror_request());

    layer = if config.origins.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> = config.origins.iter()
            .filter_map(|o| parse_or_warn(o, "origin"))
            .collect();
        layer.allow_origin(origins)
    };

    if !config.expose_headers.is_empty() {
        let headers: Vec<HeaderName> = config.expose_headers.iter()
            .filter_map(|h| parse_or_warn(h, "expose header"))
            .collect();
        layer = layer.expose_headers(headers);
    }

    // tower-http panics on credentials combined with a wildcard origin.
    if config.credentials && !config.origins.is_empty() {
        layer = layer.allow_credentials(true);
    } else if config.credentials {
        tracing::warn!("cors credentials ignored: they require an explicit origin list");
    }

    layer
}

fn parse_or_warn<T: std::str::FromStr>(raw: &str, what: &str) -> Option<T> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(value = raw, "ignoring invalid cors {what}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use bytes::Bytes;
    use http_body_util::Full;
    use tower::{ServiceBuilder, ServiceExt};

    use super::*;

    async fn call(config: &CorsConfig, req: http::Request<Full<Bytes>>) -> http::Response<Full<Bytes>> {
        ServiceBuilder::new()
            .layer(layer(config))
            .service_fn(|_req: http::Request<Full<Bytes>>| async {
                Ok::<_, Infallible>(http::Response::new(Full::new(Bytes::from_static(b"handled"))))
            })
            .oneshot(req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn default_allows_any_origin() {
        let req = http::Request::get("/users")
            .header("origin", "https://example.com")
            .body(Full::default())
            .unwrap();
        let res = call(&CorsConfig::default(), req).await;

        assert_eq!(res.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn preflight_is_answered_without_the_handler() {
        let req = http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/users")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,x-trace")
            .body(Full::default())
            .unwrap();
        let res = call(&CorsConfig::default(), req).await;

        let headers = res.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET,HEAD,PUT,PATCH,POST,DELETE");
        assert_eq!(headers["access-control-allow-headers"], "content-type,x-trace");
    }

    #[tokio::test]
    async fn explicit_origins_reject_strangers() {
        let config = CorsConfig {
            origins: vec!["https://app.example.com".to_owned()],
            ..CorsConfig::default()
        };

        let allowed = http::Request::get("/")
            .header("origin", "https://app.example.com")
            .body(Full::default())
            .unwrap();
        let res = call(&config, allowed).await;
        assert_eq!(res.headers()["access-control-allow-origin"], "https://app.example.com");

        let stranger = http::Request::get("/")
            .header("origin", "https://evil.example.com")
            .body(Full::default())
            .unwrap();
        let res = call(&config, stranger).await;
        assert!(res.headers().get("access-control-allow-origin").is_none());
    }
}
