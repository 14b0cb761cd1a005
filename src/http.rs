//! HTTP client wrapper for HFS requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, Method, RequestBuilder, Url};

use crate::error::{HfsError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for making requests to an HFS server.
///
/// Redirects are followed (the web interface redirects folder URLs without a
/// trailing slash). The session's cookie jar is registered as the cookie
/// provider, so `Set-Cookie` on every hop of a redirect chain is kept.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with an explicit timeout, TLS verification, proxy and
    /// cookie jar.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout; exceeding it surfaces as a network error
    /// * `verify_tls` - Whether to validate HTTPS certificates
    /// * `proxy` - Optional proxy URL (e.g., "http://proxy:8080")
    /// * `cookies` - Jar shared with the owning session
    pub fn with_options(
        timeout: Duration,
        verify_tls: bool,
        proxy: Option<&str>,
        cookies: Arc<Jar>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .cookie_provider(cookies);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| HfsError::InvalidArgument(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| HfsError::InvalidArgument(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    /// Start a request against an absolute URL.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }
}
