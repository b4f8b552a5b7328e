use super::{check_status, Method, Response, Transport};
use crate::error::{KouchError, Result};
use crate::options::RequestOptions;
use std::time::Duration;

const USER_AGENT: &str = concat!("kouch/", env!("CARGO_PKG_VERSION"));

/// Transport over blocking `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Joins a root and a request path. Roots given without a scheme (as
/// relative addresses like `localhost:5984/db` produce) default to http.
pub fn request_url(root: &str, path: &str) -> Result<url::Url> {
    let root = root.trim_end_matches('/');
    let full = if root.contains("://") {
        format!("{}{}", root, path)
    } else {
        format!("http://{}{}", root, path)
    };
    url::Url::parse(&full).map_err(|e| KouchError::UrlMalformed(e.to_string()))
}

impl Transport for HttpTransport {
    fn execute(&self, method: Method, path: &str, options: &RequestOptions) -> Result<Response> {
        let root = options.target.root.as_deref().ok_or(KouchError::NoRoot)?;
        let url = request_url(root, path)?;
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.client.request(Self::method(method), url);
        if !options.query.is_empty() {
            request = request.query(options.query.pairs());
        }
        if let Some(user) = &options.target.username {
            request = request.basic_auth(user, options.target.password.as_deref());
        }
        if let Some(body) = &options.body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, body.content_type.as_str())
                .body(body.data.clone());
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        tracing::debug!(status, "response received");

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        check_status(Response {
            status,
            headers,
            body: Box::new(response),
        })
    }
}
