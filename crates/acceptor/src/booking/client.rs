//! HTTP client for the Restful-Booker API.
//!
//! Authentication is a value passed to each mutating call and turned into
//! that request's `Cookie` header; the client itself holds no token.

use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::model::{Booking, BookingId, BookingPatch, CreatedBooking};
use crate::config::Credentials;
use crate::result::{AcceptorError, AcceptorResult};

const BOOKING: &str = "booking";

/// Authorization for a single request
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Auth {
    /// No credentials
    #[default]
    None,
    /// Token obtained from `/auth`, sent as `Cookie: token=<value>`
    Token(String),
}

impl Auth {
    /// Token auth from any string
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Whether no token is held
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn cookie(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Token(token) => Some(format!("token={token}")),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token(_) => f.write_str("Token(..)"),
        }
    }
}

/// Status and raw body of one API call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Decode the body, reporting malformed JSON as an assertion failure
    pub fn json<T: DeserializeOwned>(&self) -> AcceptorResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            AcceptorError::assertion(format!(
                "malformed response body ({e}): {}",
                truncate(&self.body)
            ))
        })
    }

    /// Decode the body as an untyped JSON value
    pub fn value(&self) -> AcceptorResult<Value> {
        self.json()
    }

    /// Fail unless the status equals `expected`
    pub fn expect_status(&self, expected: u16) -> AcceptorResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(AcceptorError::assertion(format!(
                "expected status {expected}, got {}: {}",
                self.status,
                truncate(&self.body)
            )))
        }
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

/// Booking API client
#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
    client: reqwest::Client,
}

impl BookingClient {
    /// Create a client for `base_url` (with or without a trailing `/`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AcceptorResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        auth: &Auth,
        body: Option<&B>,
    ) -> AcceptorResult<ApiResponse> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");
        if let Some(cookie) = auth.cookie() {
            request = request.header(COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(%method, url = %url, status, "booking api call");
        Ok(ApiResponse { status, body })
    }

    /// POST `/auth`
    pub async fn auth(&self, credentials: &Credentials) -> AcceptorResult<ApiResponse> {
        #[derive(Serialize)]
        struct AuthRequest<'a> {
            username: &'a str,
            password: &'a str,
        }
        let request = AuthRequest {
            username: &credentials.username,
            password: &credentials.password,
        };
        self.send(Method::POST, "auth", &Auth::None, Some(&request))
            .await
    }

    /// Obtain a token, failing unless `/auth` answers 200 with a non-empty token
    pub async fn token(&self, credentials: &Credentials) -> AcceptorResult<Auth> {
        #[derive(Deserialize)]
        struct AuthReply {
            token: Option<String>,
            reason: Option<String>,
        }
        let response = self.auth(credentials).await?;
        response.expect_status(200)?;
        let reply: AuthReply = response.json()?;
        match (reply.token, reply.reason) {
            (Some(token), None) if !token.is_empty() => Ok(Auth::Token(token)),
            (_, Some(reason)) => Err(AcceptorError::assertion(format!(
                "authentication failed: {reason}"
            ))),
            _ => Err(AcceptorError::assertion("authentication returned no token")),
        }
    }

    /// GET `/ping`
    pub async fn ping(&self) -> AcceptorResult<ApiResponse> {
        self.send::<()>(Method::GET, "ping", &Auth::None, None)
            .await
    }

    /// POST `/booking`
    pub async fn create(&self, booking: &Booking) -> AcceptorResult<ApiResponse> {
        self.send(Method::POST, BOOKING, &Auth::None, Some(booking))
            .await
    }

    /// GET `/booking/{id}`
    pub async fn get(&self, id: &str) -> AcceptorResult<ApiResponse> {
        self.send::<()>(Method::GET, &format!("{BOOKING}/{id}"), &Auth::None, None)
            .await
    }

    /// GET `/booking`
    pub async fn list_ids(&self) -> AcceptorResult<Vec<BookingId>> {
        let response = self
            .send::<()>(Method::GET, BOOKING, &Auth::None, None)
            .await?;
        response.expect_status(200)?;
        response.json()
    }

    /// PUT `/booking/{id}`
    pub async fn update(
        &self,
        id: &str,
        booking: &Booking,
        auth: &Auth,
    ) -> AcceptorResult<ApiResponse> {
        self.send(Method::PUT, &format!("{BOOKING}/{id}"), auth, Some(booking))
            .await
    }

    /// PATCH `/booking/{id}`
    pub async fn partial_update(
        &self,
        id: &str,
        patch: &BookingPatch,
        auth: &Auth,
    ) -> AcceptorResult<ApiResponse> {
        self.send(Method::PATCH, &format!("{BOOKING}/{id}"), auth, Some(patch))
            .await
    }

    /// DELETE `/booking/{id}`; the API answers `201 Created` on success
    pub async fn delete(&self, id: &str, auth: &Auth) -> AcceptorResult<ApiResponse> {
        self.send::<()>(Method::DELETE, &format!("{BOOKING}/{id}"), auth, None)
            .await
    }

    /// Create and decode the confirmation in one call
    pub async fn create_confirmed(&self, booking: &Booking) -> AcceptorResult<CreatedBooking> {
        let response = self.create(booking).await?;
        response.expect_status(200)?;
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie() {
        assert_eq!(Auth::None.cookie(), None);
        assert_eq!(Auth::token("abc123").cookie().as_deref(), Some("token=abc123"));
    }

    #[test]
    fn test_auth_debug_hides_token() {
        assert_eq!(format!("{:?}", Auth::token("secret")), "Token(..)");
    }

    #[test]
    fn test_expect_status() {
        let response = ApiResponse {
            status: 201,
            body: "Created".to_string(),
        };
        assert!(response.expect_status(201).is_ok());
        let err = response.expect_status(200).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: expected status 200, got 201: Created"
        );
    }

    #[test]
    fn test_malformed_body_is_assertion() {
        let response = ApiResponse {
            status: 200,
            body: "<html>".to_string(),
        };
        let err = response.value().unwrap_err();
        assert!(matches!(err, AcceptorError::Assertion { .. }));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = BookingClient::new("http://localhost:3001/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(500);
        assert_eq!(truncate(&body).len(), 200);
    }
}
