use std::time::Duration;

use bytes::Bytes;

use crate::error::WptError;

/// Path of the result endpoint, relative to the WebPageTest server root.
pub const RESULT_PATH: &str = "/jsonResult.php";

/// Wrapper around a reqwest Client with builder-pattern configuration.
pub struct HttpClient {
    inner: reqwest::Client,
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("wpt-fetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, WptError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(HttpClient { inner: client })
    }
}

impl HttpClient {
    /// Create a new client with default settings.
    pub fn new() -> Result<Self, WptError> {
        HttpClientBuilder::default().build()
    }

    /// Returns a builder for customising the client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Fetch the raw `jsonResult.php` body for `test_key`.
    ///
    /// Exactly one GET is issued. The response is released before returning,
    /// whether the body was read or not.
    ///
    /// # Errors
    ///
    /// - [`WptError::Validation`] if either argument is blank; nothing is sent.
    /// - [`WptError::Transport`] on connection, DNS, timeout or body read failure.
    /// - [`WptError::HttpStatus`] if the server answers with a non-2xx status.
    pub async fn fetch_result(&self, base_url: &str, test_key: &str) -> Result<Bytes, WptError> {
        if base_url.trim().is_empty() {
            return Err(WptError::Validation("base URL must not be empty".to_string()));
        }
        if test_key.trim().is_empty() {
            return Err(WptError::Validation("test key must not be empty".to_string()));
        }

        let endpoint = result_endpoint(base_url);
        tracing::debug!(%endpoint, test_key, "fetching test result");

        let response = self
            .inner
            .get(&endpoint)
            .query(&[("test", test_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            drop(response);
            return Err(WptError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(status = status.as_u16(), size_bytes = body.len(), "received test result");
        Ok(body)
    }
}

/// Join `base_url` and [`RESULT_PATH`], tolerating a trailing slash on the base.
pub fn result_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim().trim_end_matches('/'), RESULT_PATH)
}
