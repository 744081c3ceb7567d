//! The transport seam between prepared requests and an HTTP stack.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "reqwest")]
use crate::method::Method;
use crate::request::PreparedRequest;

/// Transport-level response: status code plus undecoded body bytes.
/// Classification happens in [`ApiRequest`](crate::ApiRequest), not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Failure to obtain any HTTP response: DNS, refused connections, timeouts,
/// TLS. Wraps whatever error the transport produced.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new<E>(underlying: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(underlying))
    }

    /// The transport's own error, for callers that need to inspect it.
    pub fn underlying(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// A transport able to carry a prepared request to the server.
///
/// The real implementation lives on [`reqwest::Client`]; tests substitute
/// their own.
#[async_trait]
pub trait ApiClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, Self::Error>;
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl ApiClient for reqwest::Client {
    type Error = reqwest::Error;

    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, Self::Error> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.request(method, request.url());
        if let Some(body) = request.body() {
            builder = builder
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(body.to_owned());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}
