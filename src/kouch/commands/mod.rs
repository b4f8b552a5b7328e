//! # Command Layer
//!
//! One module per verb. Command functions take a resolved [`Target`] and
//! their typed arguments and return a [`Request`]; they never print.
//! [`send`] runs a request and streams the response into a sink.

use crate::error::{KouchError, Result};
use crate::options::RequestOptions;
use crate::output::{head, Destination, OutputFlags, OutputMode};
use crate::resolve::FlagOverrides;
use crate::transport::{Method, Transport};
use std::io::{self, Read};

pub mod config;
pub mod create;
pub mod delete;
pub mod get;
pub mod put;

/// An address string plus the explicit target flags given with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub raw: String,
    pub overrides: FlagOverrides,
}

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            overrides: FlagOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: FlagOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A fully built request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub options: RequestOptions,
    /// Output mode used when the caller does not ask for one.
    pub default_format: &'static str,
}

impl Request {
    pub fn new(method: Method, path: String, options: RequestOptions) -> Self {
        Self {
            method,
            path,
            options,
            default_format: crate::output::DEFAULT_MODE,
        }
    }

    pub fn with_default_format(mut self, format: &'static str) -> Self {
        self.default_format = format;
        self
    }
}

/// Sends `request` and renders the response into `dest`.
///
/// Head-only requests print the response headers instead of the body. For
/// everything else the sink is created first, so a bad template fails before
/// anything is sent.
///
/// A body that breaks off mid-stream is a [`KouchError::Read`], even though
/// the transform then also fails on the truncated input. A failed transform
/// makes further writes fail with a broken pipe; its own error is reported
/// instead.
pub fn send(
    transport: &dyn Transport,
    request: &Request,
    mode: &dyn OutputMode,
    flags: &OutputFlags,
    mut dest: Destination,
) -> Result<()> {
    if request.options.head {
        let response = transport.execute(Method::Head, &request.path, &request.options)?;
        return head::write_headers(&response.headers, &mut dest);
    }

    let mut sink = mode.new_sink(flags, dest)?;
    let response = transport.execute(request.method, &request.path, &request.options)?;
    let mut body = BodyReader::new(response.body);
    if let Err(e) = io::copy(&mut body, &mut sink) {
        if body.failed {
            let _ = sink.finish();
            return Err(KouchError::Read(e));
        }
        sink.finish()?;
        return Err(KouchError::Write(e));
    }
    sink.finish()
}

/// Renders bytes produced locally, without a request.
pub fn render(
    body: &[u8],
    mode: &dyn OutputMode,
    flags: &OutputFlags,
    dest: Destination,
) -> Result<()> {
    let mut sink = mode.new_sink(flags, dest)?;
    let written = io::Write::write_all(&mut sink, body);
    sink.finish()?;
    written.map_err(KouchError::Write)
}

/// Remembers whether the response body itself failed.
struct BodyReader<R> {
    inner: R,
    failed: bool,
}

impl<R: Read> BodyReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            failed: false,
        }
    }
}

impl<R: Read> Read for BodyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                self.failed = true;
                Err(e)
            }
            other => other,
        }
    }
}
