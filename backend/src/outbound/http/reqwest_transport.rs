//! Reqwest-backed photo transport adapter.
//!
//! This adapter owns transport details only: client timeout, identity headers
//! and error mapping. Status codes and bodies are handed back untouched so
//! the domain decides what counts as a rejection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::domain::ports::{PhotoTransport, RawResponse, TransportError};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("pin-gallery/", env!("CARGO_PKG_VERSION"));

/// Photo transport that performs HTTP GET requests with a shared client.
#[derive(Clone)]
pub struct ReqwestPhotoTransport {
    client: Client,
}

impl ReqwestPhotoTransport {
    /// Build a transport using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let transport = ReqwestPhotoTransport::new(Duration::from_secs(15))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(timeout, DEFAULT_USER_AGENT)
    }

    /// Build a transport with an explicit user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_user_agent(
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.into())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PhotoTransport for ReqwestPhotoTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            debug!(
                host = url.host_str().unwrap_or_default(),
                status = status.as_u16(),
                body = %body_preview(body.as_ref()),
                "upstream returned non-success status"
            );
        }
        Ok(RawResponse::new(status.as_u16(), body.to_vec()))
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::transport(error.to_string())
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Loopback coverage for the reqwest transport.

    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use rstest::rstest;

    /// Serve one canned HTTP response and hand back the request head.
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let address = listener.local_addr().expect("listener should have an address");
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("client should connect");
            let mut reader = BufReader::new(stream.try_clone().expect("stream should clone"));
            let mut head = String::new();
            loop {
                let mut line = String::new();
                let read = reader.read_line(&mut line).expect("request should be readable");
                if read == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let mut stream = stream;
            write!(
                stream,
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("response should be written");
            head
        });
        let url = Url::parse(&format!("http://{address}/photo.jpg")).expect("url should parse");
        (url, handle)
    }

    #[rstest]
    #[case::ok("HTTP/1.1 200 OK", "jpeg", 200)]
    #[case::not_found("HTTP/1.1 404 Not Found", "missing", 404)]
    #[tokio::test]
    async fn returns_status_and_body_untouched(
        #[case] status_line: &'static str,
        #[case] body: &'static str,
        #[case] expected_status: u16,
    ) {
        let (url, server) = serve_once(status_line, body);
        let transport = ReqwestPhotoTransport::with_user_agent(Duration::from_secs(5), "gallery-test")
            .expect("client should build");

        let response = transport.get(&url).await.expect("request should complete");

        assert_eq!(response.status, expected_status);
        assert_eq!(response.body, body.as_bytes());
        let head = server.join().expect("server thread should finish");
        assert!(
            head.to_lowercase().contains("user-agent: gallery-test"),
            "configured user agent should be sent: {head}"
        );
    }

    #[tokio::test]
    async fn silent_upstream_maps_to_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let url = Url::parse(&format!(
            "http://{}/slow",
            listener.local_addr().expect("listener should have an address")
        ))
        .expect("url should parse");
        let transport =
            ReqwestPhotoTransport::new(Duration::from_millis(200)).expect("client should build");

        let error = transport.get(&url).await.expect_err("request should time out");

        assert!(
            matches!(error, TransportError::Timeout { .. }),
            "unanswered requests should map to Timeout, got {error:?}"
        );
        drop(listener);
    }

    #[tokio::test]
    async fn refused_connection_maps_to_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let address = listener.local_addr().expect("listener should have an address");
        drop(listener);
        let url = Url::parse(&format!("http://{address}/gone")).expect("url should parse");
        let transport =
            ReqwestPhotoTransport::new(Duration::from_secs(5)).expect("client should build");

        let error = transport.get(&url).await.expect_err("request should fail");

        assert!(
            matches!(error, TransportError::Transport { .. }),
            "refused connections should map to Transport, got {error:?}"
        );
    }

    #[test]
    fn body_preview_compacts_whitespace_and_truncates() {
        assert_eq!(body_preview(b"  {\n  \"stat\": \"fail\"\n}  "), "{ \"stat\": \"fail\" }");

        let long = "x".repeat(200);
        let preview = body_preview(long.as_bytes());
        assert_eq!(preview.len(), 163);
        assert!(preview.ends_with("..."));
    }
}
