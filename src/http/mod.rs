//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, body buffering)
//!     → request.rs (peer address, real IP / scheme helpers)
//!     → Router::serve_http (middleware chain, handler)
//!     → response.rs (buffered writer → hyper response)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RemoteAddr, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::{HttpServer, ServerError};
