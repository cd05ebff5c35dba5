//! Bundled middleware.
//!
//! Each constructor returns a [`Middleware`](crate::Middleware) usable at any
//! scope: `Router::pre`, `Router::use_middleware`, `Group::use_middleware`, or
//! per route.
//!
//! | Middleware | Effect |
//! |------------|--------|
//! | [`recover`] | panics and `Err` results → JSON error response |
//! | [`logger`] | one structured log line per request |
//! | [`request_id`] | propagate or generate `X-Request-ID` |
//! | [`bearer_auth`] | require `Authorization: Bearer <token>` |
//! | [`metrics`] | request counter and latency histogram |

mod auth;
mod logger;
mod metrics;
mod recover;
pub mod request_id;

pub use auth::bearer_auth;
pub use logger::logger;
pub use self::metrics::metrics;
pub use recover::recover;
pub use request_id::{request_id, RequestId, RequestIdExt, REQUEST_ID_KEY};
