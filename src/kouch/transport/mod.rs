//! # Transport Layer
//!
//! The [`Transport`] trait is the seam between request building and the
//! network, in the same way a storage trait separates business logic from
//! persistence.
//!
//! ## Implementations
//!
//! - [`http::HttpTransport`]: production transport over blocking `reqwest`
//! - `memory::MemoryTransport`: canned responses for tests; records every
//!   request it receives. Built with `cfg(test)` or the `test_utils` feature
//!
//! Both treat any status of 400 or above as an error, built from the server's
//! `{"error": ..., "reason": ...}` body when one is present.

use crate::error::{KouchError, Result};
use crate::options::RequestOptions;
use std::fmt;
use std::io::Read;

pub mod http;
#[cfg(any(test, feature = "test_utils"))]
pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server response. The body is read lazily and only once.
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Response {
    /// First value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes requests against a server.
pub trait Transport {
    /// Sends `method` to `path` (relative to the target's root) with the
    /// query, body and credentials carried by `options`.
    fn execute(&self, method: Method, path: &str, options: &RequestOptions) -> Result<Response>;
}

#[derive(serde::Deserialize)]
struct ServerError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

/// Converts an error status into [`KouchError::Http`], consuming the body.
pub(crate) fn check_status(mut response: Response) -> Result<Response> {
    if response.status < 400 {
        return Ok(response);
    }
    let mut raw = Vec::new();
    // The status is the error; a body we cannot read only loses detail.
    let _ = response.body.read_to_end(&mut raw);

    let message = match serde_json::from_slice::<ServerError>(&raw) {
        Ok(e) if !e.reason.is_empty() && !e.error.is_empty() => format!("{}: {}", e.error, e.reason),
        Ok(e) if !e.error.is_empty() => e.error,
        _ => status_text(response.status).to_string(),
    };
    Err(KouchError::Http {
        status: response.status,
        message,
    })
}

fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        412 => "Precondition Failed",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "request failed",
    }
}
