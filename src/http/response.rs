//! Buffered response writer.
//!
//! # Responsibilities
//! - Collect status, headers and body written by the handler chain
//! - Commit the status on the first `write_header` (or first body write)
//! - Convert into a hyper response once the chain returns
//!
//! # Design Decisions
//! - Fully buffered: handlers run to completion before anything hits the wire
//! - A writer nobody touched becomes `200 OK` with an empty body
//! - Late `write_header` calls are ignored and logged, never an error

use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Response, StatusCode};

/// Response sink handed to [`Router::serve_http`](crate::Router::serve_http).
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
}

impl ResponseWriter {
    /// Create an empty, uncommitted writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers that will be sent. Changes after commit still apply since the
    /// writer is buffered.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a single header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Commit the status code. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            tracing::warn!(
                current = %self.status,
                ignored = %status,
                "Superfluous write_header call"
            );
            return;
        }
        self.status = status;
        self.committed = true;
    }

    /// Append body bytes, committing `200 OK` if no status was written yet.
    pub fn write(&mut self, chunk: &[u8]) {
        if !self.committed {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status has been committed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Consume the writer into a hyper response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::CONTENT_TYPE;

    #[test]
    fn untouched_writer_is_empty_ok() {
        let writer = ResponseWriter::new();
        assert!(!writer.is_committed());

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn first_status_wins() {
        let mut writer = ResponseWriter::new();
        writer.write_header(StatusCode::CREATED);
        writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(writer.status(), StatusCode::CREATED);
    }

    #[test]
    fn write_commits_ok() {
        let mut writer = ResponseWriter::new();
        writer.write(b"hello ");
        writer.write(b"world");
        writer.write_header(StatusCode::NOT_FOUND);

        assert!(writer.is_committed());
        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.body(), b"hello world");
    }

    #[test]
    fn headers_carry_into_response() {
        let mut writer = ResponseWriter::new();
        writer.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.write_header(StatusCode::ACCEPTED);

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }
}
