// Request builder: turns the command-line target and optional body argument
// into an `ApiRequest`. All input validation that can fail without the
// network happens here.

use reqwest::{Method, Url};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL {target}: {source}")]
    InvalidUrl {
        target: String,
        source: url::ParseError,
    },

    #[error("Invalid API server {server}: {source}")]
    InvalidApiServer {
        server: String,
        source: url::ParseError,
    },

    #[error("Invalid JSON in \"json\" parameter: {0}")]
    InvalidJsonParameter(serde_json::Error),

    #[error("Failed to read request body from stdin: {0}")]
    Stdin(std::io::Error),
}

/// A single API call: where to send it and what to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: Url,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Build a request from the raw target and body arguments.
    ///
    /// The body argument `-` reads stdin to the end. Without a body the
    /// target's `json` query parameter, if any, must be valid JSON.
    pub fn build<R: Read>(
        target: &str,
        body_arg: Option<&str>,
        apiserver: &str,
        stdin: R,
    ) -> Result<Self, RequestError> {
        let body = read_body(body_arg, stdin)?;
        let endpoint = resolve(target, apiserver)?;
        if body.is_none() {
            check_json_parameter(&endpoint)?;
        }
        Ok(ApiRequest { endpoint, body })
    }

    /// POST exactly when a body is present.
    pub fn method(&self) -> Method {
        if self.body.is_some() {
            Method::POST
        } else {
            Method::GET
        }
    }
}

/// Whether `target` is a full URL rather than a path on the API server.
pub fn is_absolute(target: &str) -> bool {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve `target` against `apiserver` unless it is already absolute.
pub fn resolve(target: &str, apiserver: &str) -> Result<Url, RequestError> {
    if is_absolute(target) {
        return Url::parse(target).map_err(|source| RequestError::InvalidUrl {
            target: target.to_string(),
            source,
        });
    }
    let base = Url::parse(apiserver).map_err(|source| RequestError::InvalidApiServer {
        server: apiserver.to_string(),
        source,
    })?;
    base.join(target).map_err(|source| RequestError::InvalidUrl {
        target: target.to_string(),
        source,
    })
}

fn read_body<R: Read>(body_arg: Option<&str>, mut stdin: R) -> Result<Option<Vec<u8>>, RequestError> {
    match body_arg {
        None => Ok(None),
        Some("-") => {
            let mut text = String::new();
            stdin.read_to_string(&mut text).map_err(RequestError::Stdin)?;
            Ok(Some(text.into_bytes()))
        }
        Some(literal) => Ok(Some(literal.as_bytes().to_vec())),
    }
}

/// Reject a GET whose `json` query parameter is not valid JSON. An empty or
/// missing parameter passes; with repeats the last one is checked.
pub fn check_json_parameter(endpoint: &Url) -> Result<(), RequestError> {
    let value = endpoint
        .query_pairs()
        .filter(|(key, value)| key == "json" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .last();
    if let Some(json) = value {
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(RequestError::InvalidJsonParameter)?;
    }
    Ok(())
}
