//! Reqwest-backed API transport.
//!
//! This adapter owns transport details only: URL resolution, headers, JSON
//! body serialisation, timeout, and error mapping. Status codes are passed
//! through untouched for the domain to interpret.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};

use crate::domain::HttpMethod;
use crate::domain::ports::{ApiTransport, ApiTransportError, OutboundRequest, TransportResponse};

const DEFAULT_USER_AGENT: &str = concat!("platanera-client/", env!("CARGO_PKG_VERSION"));

/// API transport that sends requests relative to one base URL.
#[derive(Debug, Clone)]
pub struct ReqwestApiTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestApiTransport {
    /// Build a transport with an explicit per-request timeout.
    /// ```rust,ignore
    /// let transport = ReqwestApiTransport::new(base_url, Duration::from_secs(30))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// Base URL every request path is joined to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl ApiTransport for ReqwestApiTransport {
    async fn send(
        &self,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, ApiTransportError> {
        let url = endpoint_url(&self.base_url, &request.path)?;
        let mut builder = self
            .client
            .request(reqwest_method(request.method), url)
            .header(header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = request.bearer_token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn endpoint_url(base_url: &Url, path: &str) -> Result<Url, ApiTransportError> {
    base_url
        .join(path.trim_start_matches('/'))
        .map_err(|error| ApiTransportError::invalid_request(format!("bad path '{path}': {error}")))
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiTransportError {
    if error.is_timeout() {
        ApiTransportError::timeout(error.to_string())
    } else if error.is_builder() {
        ApiTransportError::invalid_request(error.to_string())
    } else {
        ApiTransportError::transport(error.to_string())
    }
}
