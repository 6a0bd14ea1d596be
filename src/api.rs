// Dispatcher: a small blocking HTTP client that signs and sends exactly one
// API request. The underlying connection lives as long as the `ApiClient`
// and is released when it is dropped, whichever way the call ends.

use crate::auth::{self, AUTH_HEADER};
use crate::config::Config;
use crate::config::Credentials;
use crate::request::ApiRequest;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

/// Content type sent with every request, including GETs.
pub const REQUEST_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Why a request produced no usable response. HTTP error statuses are not
/// errors at this level; the caller inspects `ApiResponse::status`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Connect, TLS, timeout, or body read failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server answered but the response could not be interpreted.
    #[error("{0}")]
    MalformedResponse(String),
}

/// Everything the presenter needs from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Empty when the server sent no `Content-Type`.
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Holds the reqwest blocking client and the credentials used to sign.
pub struct ApiClient {
    client: Client,
    credentials: Credentials,
}

impl ApiClient {
    /// Create a client honouring the configured timeout.
    pub fn new(config: &Config) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(ApiClient {
            client,
            credentials: config.credentials.clone(),
        })
    }

    /// Sign and send `request`, then read the full response.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, DispatchError> {
        let header = auth::authenticate(&self.client, &request.endpoint, &self.credentials);
        let method = request.method();
        tracing::debug!(%method, url = %request.endpoint, "sending request");

        let mut builder = self
            .client
            .request(method, request.endpoint.clone())
            .header(AUTH_HEADER, header.to_string())
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let res = builder.send()?;
        let status = res.status().as_u16();
        let content_type = match res.headers().get(CONTENT_TYPE) {
            Some(value) => value
                .to_str()
                .map_err(|e| DispatchError::MalformedResponse(format!("bad Content-Type header: {e}")))?
                .to_string(),
            None => String::new(),
        };
        let body = res.bytes()?.to_vec();
        tracing::debug!(status, %content_type, bytes = body.len(), "response received");

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}
