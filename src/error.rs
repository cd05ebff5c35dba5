//! Error types for handlers and the request context.
//!
//! Handlers and middleware return [`Result<(), Error>`](crate::HandlerResult).
//! The core never turns an `Err` into a response on its own; that is the job
//! of a recovery layer such as [`crate::middleware::recover`], which uses
//! [`Error::status`] to pick the status code.

use hyper::StatusCode;
use serde::Serialize;

/// Failure raised by a handler, a middleware, or a [`Context`](crate::Context) helper.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value could not be serialized to, or deserialized from, JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An urlencoded form or query string could not be decoded.
    #[error("Form decoding error: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// `bind` was asked to decode a body whose content type it does not handle.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A handler chose to fail with a specific HTTP status.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// Any other failure, boxed.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Build an error carrying an explicit HTTP status.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    /// Status code a recovery layer should answer with.
    ///
    /// - `Json` / `Form` → 400 Bad Request (the client sent something undecodable)
    /// - `UnsupportedMediaType` → 415
    /// - `Http` → its own status
    /// - `Other` → 500
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Json(e) if e.is_data() || e.is_syntax() || e.is_eof() => StatusCode::BAD_REQUEST,
            Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Form(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Http { status, .. } => *status,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body written for error responses: `{"code":404,"message":"Not Found"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody<'a> {
    pub code: u16,
    pub message: &'a str,
}

impl<'a> ErrorBody<'a> {
    pub fn new(status: StatusCode, message: &'a str) -> Self {
        Self {
            code: status.as_u16(),
            message,
        }
    }

    /// Body using the status' canonical reason phrase as the message.
    pub fn canonical(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Unknown Status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_status_and_message() {
        let err = Error::http(StatusCode::FORBIDDEN, "nope");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn decode_failures_map_to_bad_request() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = Error::UnsupportedMediaType("text/xml".into());
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn canonical_body_serializes() {
        let body = serde_json::to_string(&ErrorBody::canonical(StatusCode::NOT_FOUND)).unwrap();
        assert_eq!(body, r#"{"code":404,"message":"Not Found"}"#);
    }

    #[test]
    fn boxed_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = Error::Other(Box::new(io));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "disk gone");
    }
}
