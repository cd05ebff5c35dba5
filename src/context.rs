//! Per-request context passed through the handler chain.
//!
//! A [`Context`] is created by the dispatcher for every request and dropped
//! when the chain returns. It owns the buffered request, the response writer
//! and a typed scratch store middleware use to hand values to each other.

use std::any::Any;
use std::collections::HashMap;

use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, COOKIE};
use hyper::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::http::request;
use crate::http::response::ResponseWriter;

pub const MIME_APPLICATION_JSON: &str = "application/json";
pub const MIME_APPLICATION_JSON_CHARSET_UTF8: &str = "application/json; charset=UTF-8";
pub const MIME_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_TEXT_PLAIN_CHARSET_UTF8: &str = "text/plain; charset=UTF-8";

/// A `name=value` pair from the `Cookie` request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Per-request state carrier and response facade.
pub struct Context {
    request: Request<Bytes>,
    response: ResponseWriter,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new(request: Request<Bytes>, response: ResponseWriter) -> Self {
        Self {
            request,
            response,
            values: HashMap::new(),
        }
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Mutable request access, e.g. for pre-middleware rewriting the path.
    pub fn request_mut(&mut self) -> &mut Request<Bytes> {
        &mut self.request
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Give the writer back once the chain has finished.
    pub fn into_response(self) -> ResponseWriter {
        self.response
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Client address, honouring `X-Forwarded-For` and `X-Real-IP`.
    pub fn real_ip(&self) -> String {
        request::real_ip(&self.request)
    }

    pub fn scheme(&self) -> String {
        request::scheme(&self.request)
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// First value of a query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.query_all()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// All query parameters in request order.
    pub fn query_all(&self) -> Vec<(String, String)> {
        let query = self.request.uri().query().unwrap_or("");
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// First value of a form field. Body fields take precedence over query
    /// parameters of the same name.
    pub fn form(&self, name: &str) -> Option<String> {
        self.form_all()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Urlencoded body fields (when the body is a form) followed by query parameters.
    pub fn form_all(&self) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = if self.is_content_type(MIME_APPLICATION_FORM) {
            url::form_urlencoded::parse(self.request.body())
                .into_owned()
                .collect()
        } else {
            Vec::new()
        };
        fields.extend(self.query_all());
        fields
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookie_all().into_iter().find(|c| c.name == name)
    }

    /// Every cookie across all `Cookie` headers. Malformed pairs are skipped.
    pub fn cookie_all(&self) -> Vec<Cookie> {
        self.request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"');
                Some(Cookie {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Typed read from the scratch store. `None` when absent or of another type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Store a value for later middleware or the handler. Replaces any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Decode the request into `T`.
    ///
    /// - `application/json` bodies through serde_json
    /// - urlencoded form bodies through serde_urlencoded
    /// - an empty body without content type decodes the query string
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if self.is_content_type(MIME_APPLICATION_JSON) {
            return Ok(serde_json::from_slice(self.request.body())?);
        }
        if self.is_content_type(MIME_APPLICATION_FORM) {
            return Ok(serde_urlencoded::from_bytes(self.request.body())?);
        }
        match self.content_type() {
            None if self.request.body().is_empty() => {
                let query = self.request.uri().query().unwrap_or("");
                Ok(serde_urlencoded::from_str(query)?)
            }
            None => Err(Error::UnsupportedMediaType("<missing>".to_string())),
            Some(other) => Err(Error::UnsupportedMediaType(other.to_string())),
        }
    }

    /// Send `value` as JSON with `status`.
    ///
    /// Serialization happens first; on failure nothing is written and the
    /// error is returned. Otherwise the content type is set, then the status
    /// is written, then the body.
    ///
    /// On a writer that is already committed the earlier status and content
    /// type stand and the JSON is appended to the existing body.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(value)?;
        self.send(status, MIME_APPLICATION_JSON_CHARSET_UTF8, &body);
        Ok(())
    }

    /// Send a plain text body with `status`. Committed writers behave as in
    /// [`Context::json`].
    pub fn text(&mut self, status: StatusCode, body: &str) -> Result<(), Error> {
        self.send(status, MIME_TEXT_PLAIN_CHARSET_UTF8, body.as_bytes());
        Ok(())
    }

    fn send(&mut self, status: StatusCode, content_type: &'static str, body: &[u8]) {
        if !self.response.is_committed() {
            self.response
                .set_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.response.write_header(status);
        self.response.write(body);
    }

    fn content_type(&self) -> Option<&str> {
        self.request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    fn is_content_type(&self, mime: &str) -> bool {
        self.content_type()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().eq_ignore_ascii_case(mime))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
