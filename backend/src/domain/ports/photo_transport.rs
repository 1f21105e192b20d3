//! Driven port for issuing HTTP GET requests.
//!
//! Both the photo-search calls and the image downloads go through this port.
//! It reports what came back on the wire and leaves status and body
//! interpretation to the domain.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response from a status code and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is within `200..=299`.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

define_port_error! {
    /// Failures raised before a response was received.
    pub enum TransportError {
        /// Connection, TLS, or body read failed.
        Transport { message: String } =>
            "photo transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout { message: String } =>
            "photo transport timed out: {message}",
    }
}

/// Port for fetching a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoTransport: Send + Sync {
    /// Issue a GET request against `url`.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let response = transport.get(&url).await?;
    /// assert!(response.is_success());
    /// # Ok::<(), pin_gallery::domain::ports::TransportError>(())
    /// ```
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}
