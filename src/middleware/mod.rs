//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. Every request passes through, in order:
//!
//! 1. [`trace`]: per-request span and completion log
//! 2. [`cors`]: origin checks and preflight answers
//! 3. body collection and JSON parsing (see [`Request::json`](crate::Request::json))
//! 4. the router or the GraphQL endpoint
//! 5. [`classify`]: terminal error-to-response mapping
//!
//! Stages 1 and 2 are Tower layers wrapped around the dispatcher by
//! [`Server`](crate::Server). Stage 5 is not registered anywhere: it runs for
//! every `Err` a handler returns and every panic it raises, so it is always
//! last.

pub mod classify;
pub mod cors;
pub mod trace;
