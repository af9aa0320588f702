//! Outbound HTTP abstraction for upstream source fetches.
//!
//! The trait keeps adapters testable without a network: use
//! [`HttpTransport`] in production and [`mock::MockTransport`] in unit tests
//! (behind the `test-utils` feature). Timeouts are the transport's business;
//! the sync engine applies none of its own.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from one upstream fetch. Opaque to merge logic beyond "it failed".
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status} for {url}")]
    Status { status: u16, url: String },
}

/// Raw byte fetch from an upstream URL.
#[async_trait]
pub trait SourceTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// reqwest-backed implementation of [`SourceTransport`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport with a custom `reqwest::Client` (for testing with
    /// custom config).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Scripted transport for unit testing.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{SourceTransport, TransportError};

    enum Scripted {
        Body(Vec<u8>),
        Status(u16),
    }

    /// Mock implementation of [`SourceTransport`].
    ///
    /// Stub URLs with `stub`/`stub_json`/`fail`, then verify traffic with
    /// `calls()`. Unstubbed URLs answer 404.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Scripted>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Stub a URL with a raw body.
        pub fn stub(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.into(), Scripted::Body(body.into()));
        }

        /// Stub a URL with a JSON value.
        pub fn stub_json(&self, url: impl Into<String>, body: &serde_json::Value) {
            self.stub(url, body.to_string().into_bytes());
        }

        /// Make a URL answer with an error status.
        pub fn fail(&self, url: impl Into<String>, status: u16) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.into(), Scripted::Status(status));
        }

        /// Forget a stub so subsequent fetches 404.
        pub fn clear(&self, url: &str) {
            self.responses.lock().unwrap().remove(url);
        }

        /// All URLs fetched, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceTransport for MockTransport {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().push(url.to_string());

            match self.responses.lock().unwrap().get(url) {
                Some(Scripted::Body(body)) => Ok(body.clone()),
                Some(Scripted::Status(status)) => Err(TransportError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                None => Err(TransportError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }
}
