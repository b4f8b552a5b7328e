use super::{check_status, Method, Response, Transport};
use crate::error::{KouchError, Result};
use crate::options::{Query, RequestOptions};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

/// A request as received by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<Vec<u8>>,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// In-memory transport serving canned responses keyed by method and path.
///
/// Unknown routes answer `404 not_found`, like a server would.
#[derive(Default)]
pub struct MemoryTransport {
    routes: HashMap<(Method, String), CannedResponse>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(
        mut self,
        method: Method,
        path: &str,
        status: u16,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Self {
        self.routes.insert(
            (method, path.to_string()),
            CannedResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_vec(),
            },
        );
        self
    }

    /// Shorthand for a `200` JSON response.
    pub fn with_json(self, method: Method, path: &str, body: &str) -> Self {
        self.with_response(
            method,
            path,
            200,
            &[("Content-Type", "application/json")],
            body.as_bytes(),
        )
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    fn execute(&self, method: Method, path: &str, options: &RequestOptions) -> Result<Response> {
        if options.target.root.is_none() {
            return Err(KouchError::NoRoot);
        }
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                method,
                path: path.to_string(),
                query: options.query.clone(),
                body: options.body.as_ref().map(|b| b.data.clone()),
                username: options.target.username.clone(),
            });
        }

        let canned = self
            .routes
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_else(|| CannedResponse {
                status: 404,
                headers: vec![("Content-Type".into(), "application/json".into())],
                body: br#"{"error":"not_found","reason":"missing"}"#.to_vec(),
            });

        let body = if method == Method::Head {
            Vec::new()
        } else {
            canned.body
        };
        check_status(Response {
            status: canned.status,
            headers: canned.headers,
            body: Box::new(Cursor::new(body)),
        })
    }
}
