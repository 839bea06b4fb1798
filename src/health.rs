//! Liveness and readiness probe handlers.
//!
//! | Probe | Path | Answers |
//! |---|---|---|
//! | **Liveness** | `/healthz` | the process accepts HTTP |
//! | **Readiness** | `/readyz` | the schema assembled and routes are mounted |
//!
//! Both are plain REST routes, so they run through the same pipeline as
//! everything else and are never confused with the GraphQL path.
//!
//! ```rust,no_run
//! use trellis::{Router, health};
//!
//! let router = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```

use crate::{Request, Response};

/// Always `200 ok`. No dependencies.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 ready`.
///
/// The server only binds after schema assembly succeeds, so reaching this
/// handler at all means startup completed. Replace it when readiness should
/// gate on a downstream dependency.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
