// Authenticator: builds the `X-cXense-Authentication` header.
//
// The server accepts a signature only if the signed date is close to its own
// clock, so the date is fetched from the server first. If that request fails we
// sign the local time instead and let the server decide.

use crate::config::Credentials;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

/// Name of the header carrying the signature.
pub const AUTH_HEADER: &str = "X-cXense-Authentication";

/// Unauthenticated endpoint returning the server's current time.
pub const DATE_PATH: &str = "/public/date";

type HmacSha256 = Hmac<Sha256>;

/// Why the server clock could not be read.
#[derive(Debug, Error)]
pub enum DateError {
    #[error("no date endpoint for {endpoint}: {source}")]
    Url {
        endpoint: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct DateResponse {
    date: String,
}

/// Lowercase hex HMAC-SHA256 of `date`, keyed by `secret`.
pub fn sign(date: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(date.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Local UTC time in the same shape the date endpoint returns.
pub fn local_date() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Signed header value for one request. Built fresh every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    pub username: String,
    pub date: String,
    pub signature: String,
}

impl AuthHeader {
    pub fn new(credentials: &Credentials, date: &str) -> Self {
        AuthHeader {
            username: credentials.username().to_string(),
            date: date.to_string(),
            signature: sign(date, credentials.secret()),
        }
    }
}

impl fmt::Display for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username={} date={} hmac-sha256-hex={}",
            self.username, self.date, self.signature
        )
    }
}

/// Ask the server hosting `endpoint` for its current time.
pub fn server_date(client: &Client, endpoint: &Url) -> Result<String, DateError> {
    // `join` with an absolute path keeps scheme, host and port.
    let url = endpoint.join(DATE_PATH).map_err(|source| DateError::Url {
        endpoint: endpoint.to_string(),
        source,
    })?;
    let response: DateResponse = client.get(url).send()?.json()?;
    Ok(response.date)
}

/// Sign a request to `endpoint`, preferring the server's clock.
pub fn authenticate(client: &Client, endpoint: &Url, credentials: &Credentials) -> AuthHeader {
    let date = match server_date(client, endpoint) {
        Ok(date) => {
            tracing::debug!(%date, "using server date");
            date
        }
        Err(err) => {
            let date = local_date();
            tracing::debug!(error = %err, %date, "server date unavailable, using local clock");
            date
        }
    };
    AuthHeader::new(credentials, &date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_matches_rfc4231_vector() {
        assert_eq!(
            sign("what do ya want for nothing?", "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn sign_is_deterministic() {
        let date = "2013-04-22T15:06:20.252Z";
        let first = sign(date, "api&user&secret");
        assert_eq!(first, sign(date, "api&user&secret"));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, sign("2013-04-22T15:06:20.253Z", "api&user&secret"));
        assert_ne!(first, sign(date, "api&user&other"));
    }

    #[test]
    fn header_has_fixed_field_order() {
        let creds = Credentials::new("user@example.com", "api&key").unwrap();
        let header = AuthHeader::new(&creds, "2013-04-22T15:06:20.252Z");
        assert_eq!(
            header.to_string(),
            format!(
                "username=user@example.com date=2013-04-22T15:06:20.252Z hmac-sha256-hex={}",
                sign("2013-04-22T15:06:20.252Z", "api&key")
            )
        );
    }

    #[test]
    fn local_date_is_iso8601_utc() {
        let date = local_date();
        assert!(date.ends_with('Z'));
        assert_eq!(date.len(), "2013-04-22T15:06:20.252Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&date).is_ok());
    }

    #[test]
    fn endpoint_without_base_signs_local_time() {
        let client = Client::new();
        let endpoint = Url::parse("data:text/plain,hello").unwrap();
        let err = server_date(&client, &endpoint).unwrap_err();
        assert!(matches!(err, DateError::Url { .. }));

        let creds = Credentials::new("user@example.com", "api&key").unwrap();
        let header = authenticate(&client, &endpoint, &creds);
        assert!(header.date.ends_with('Z'));
        assert_eq!(header.signature, sign(&header.date, "api&key"));
    }

    #[test]
    fn unreachable_server_falls_back_to_local_clock() {
        let client = Client::new();
        // Port 9 on localhost is the discard service and is normally closed.
        let endpoint = Url::parse("http://127.0.0.1:9/site").unwrap();
        let creds = Credentials::new("user@example.com", "api&key").unwrap();
        let header = authenticate(&client, &endpoint, &creds);
        assert!(header.date.ends_with('Z'));
        assert_eq!(header.signature, sign(&header.date, "api&key"));
    }
}
