//! Session core: base endpoint, credentials, cookie jar and the single
//! request path every operation goes through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, REFERER, SET_COOKIE};
use reqwest::multipart::Form;
use reqwest::{Body, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::auth::{AuthMode, Credentials, EffectiveAuth};
use crate::config::ClientConfig;
use crate::error::{HfsError, Result};
use crate::http::HttpClient;

/// Header the server requires on state-changing requests.
pub const ANTI_CSRF_HEADER: &str = "x-hfs-anti-csrf";

/// Body of an outgoing request.
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    /// Streamed body with a known length, sent with `Content-Length`.
    Stream { body: Body, len: u64 },
    Json(serde_json::Value),
    Multipart(Form),
}

/// Per-request parameters for [`Session::request`].
#[derive(Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    auth: AuthMode,
    referer: Option<Url>,
    cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new(auth: AuthMode) -> Self {
        Self {
            auth,
            ..Default::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add `x-hfs-anti-csrf: 1`.
    pub fn anti_csrf(self) -> Self {
        self.header(
            HeaderName::from_static(ANTI_CSRF_HEADER),
            HeaderValue::from_static("1"),
        )
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Referer sent in session mode. Defaults to the target's parent directory.
    pub fn referer(mut self, referer: Url) -> Self {
        self.referer = Some(referer);
        self
    }

    pub fn cancel(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth
    }
}

/// A successful response, fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Decode the body as JSON, reporting a shape mismatch as a protocol error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HfsError::Protocol(format!("Unexpected response body: {}", e)))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An HFS client session.
///
/// Owns the base endpoint, optional credentials and the cookie jar. All
/// methods take `&self`; share one instance across tasks behind an `Arc`.
/// The cookie jar is internally locked and login is serialized, so
/// concurrent requests never observe a half-applied cookie update.
#[derive(Debug)]
pub struct Session {
    http: HttpClient,
    base_url: Url,
    credentials: Option<Credentials>,
    cookies: Arc<Jar>,
    established: AtomicBool,
    login_lock: Mutex<()>,
}

impl Session {
    /// Create a session from configuration. No network traffic happens here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let cookies = Arc::new(Jar::default());
        let http = HttpClient::with_options(
            config.timeout(),
            config.verify_tls,
            config.proxy.as_deref(),
            Arc::clone(&cookies),
        )?;
        let credentials = match (config.username, config.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        };

        Ok(Self {
            http,
            base_url,
            credentials,
            cookies,
            established: AtomicBool::new(false),
            login_lock: Mutex::new(()),
        })
    }

    /// Session without credentials.
    pub fn anonymous(base_url: &str) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether a login has succeeded on this session.
    pub fn is_established(&self) -> bool {
        self.established.load(Ordering::Acquire)
    }

    /// Cookie header that session-mode requests to `path` would carry.
    pub fn cookie_header(&self, path: &str) -> Option<String> {
        let url = self.url_for(path).ok()?;
        self.cookies
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Log in by sending credentials as the `login` query parameter.
    ///
    /// The server answers with a session cookie which is stored and reused
    /// by every later session-mode request; the password is not sent again.
    /// Cookies set anywhere along a redirect chain count. A login that sets
    /// no cookie fails with [`HfsError::Auth`], even if the jar already held one.
    pub async fn establish_session(&self, username: &str, password: &str) -> Result<()> {
        let credentials = Credentials::new(username, password);
        let url = self.url_for("/")?;
        let options = RequestOptions::new(AuthMode::Basic).query("login", credentials.login_value());
        let before = self.cookies.cookies(&self.base_url);

        let response = self
            .send(Method::GET, url, options, EffectiveAuth::Anonymous)
            .await?;

        let after = self.cookies.cookies(&self.base_url);
        let issued = response.headers.contains_key(SET_COOKIE) || (after.is_some() && after != before);
        if !issued {
            return Err(HfsError::Auth {
                status: response.status,
                path: "/".to_string(),
            });
        }

        self.established.store(true, Ordering::Release);
        info!(username, "hfs session established");
        Ok(())
    }

    /// Log in with the configured credentials.
    pub async fn login(&self) -> Result<()> {
        let credentials = self
            .credentials
            .clone()
            .ok_or_else(|| HfsError::InvalidArgument("No credentials configured".to_string()))?;
        self.establish_session(credentials.username(), credentials.password())
            .await
    }

    /// Issue one HTTP request to `path` (relative to the base URL).
    ///
    /// Non-success statuses are mapped through [`HfsError::from_status`].
    /// Nothing is retried here.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<RawResponse> {
        let url = self.url_for(path)?;
        self.request_url(method, url, options).await
    }

    pub(crate) async fn request_url(
        &self,
        method: Method,
        url: Url,
        options: RequestOptions,
    ) -> Result<RawResponse> {
        let auth = EffectiveAuth::resolve(options.auth, self.credentials.as_ref());
        if auth.uses_session() {
            self.ensure_session(options.cancel.as_ref()).await?;
        }
        self.send(method, url, options, auth).await
    }

    /// Log in once if session auth is needed and credentials are available.
    ///
    /// Waiting for the lock and the login itself are both raced against
    /// `cancel`. Dropping a half-done login leaves the session unestablished.
    async fn ensure_session(&self, cancel: Option<&CancellationToken>) -> Result<()> {
        if self.is_established() {
            return Ok(());
        }
        let Some(credentials) = self.credentials.as_ref() else {
            return Ok(());
        };

        let login = async {
            let _guard = self.login_lock.lock().await;
            if self.is_established() {
                return Ok(());
            }
            self.establish_session(credentials.username(), credentials.password())
                .await
        };

        match cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(HfsError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(HfsError::Cancelled),
                    result = login => result,
                }
            }
            None => login.await,
        }
    }

    async fn send(
        &self,
        method: Method,
        mut url: Url,
        options: RequestOptions,
        auth: EffectiveAuth,
    ) -> Result<RawResponse> {
        let RequestOptions {
            query,
            headers,
            body,
            referer,
            cancel,
            ..
        } = options;

        let path = url.path().to_string();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let mut builder = self.http.request(method.clone(), url.clone()).headers(headers);
        match auth {
            EffectiveAuth::Basic => {
                if let Some(credentials) = &self.credentials {
                    builder = builder.basic_auth(credentials.username(), Some(credentials.password()));
                }
            }
            // The jar is the client's cookie provider, so cookies go out with
            // every request and only the Referer is added here.
            EffectiveAuth::Session { referer: with_referer } => {
                if with_referer {
                    let referer = referer.unwrap_or_else(|| parent_url(&url));
                    builder = builder.header(REFERER, referer.as_str());
                }
            }
            EffectiveAuth::Anonymous => {}
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream { body, len } => builder.header(CONTENT_LENGTH, len).body(body),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        debug!(%method, path = %path, ?auth, "hfs request");

        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| HfsError::network(&path, e))?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| HfsError::network(&path, e))?;
            Ok::<_, HfsError>(RawResponse {
                status,
                headers,
                body,
            })
        };

        let response = match cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(HfsError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(HfsError::Cancelled),
                    result = exchange => result?,
                }
            }
            None => exchange.await?,
        };

        debug!(%method, path = %path, status = %response.status, "hfs response");

        if !response.status.is_success() {
            return Err(HfsError::from_status(response.status, path, response.text()));
        }
        Ok(response)
    }

    /// Absolute URL for `path`, percent-encoding each segment.
    ///
    /// A trailing `/` on a non-root path is kept (folder URLs).
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        let trailing_slash = path.ends_with('/') && path.split('/').any(|s| !s.is_empty());
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                HfsError::InvalidArgument(format!("Base URL cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if trailing_slash {
                segments.push("");
            }
        }
        Ok(url)
    }
}

/// Parse and validate the server root.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let mut url = Url::parse(trimmed)
        .map_err(|e| HfsError::InvalidArgument(format!("Invalid base URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(HfsError::InvalidArgument(format!(
            "Base URL must be http(s): {}",
            raw
        )));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// URL of the directory containing `url`, with a trailing slash.
pub(crate) fn parent_url(url: &Url) -> Url {
    let mut parent = url.clone();
    let path = url.path().trim_end_matches('/');
    let parent_path = match path.rfind('/') {
        Some(i) => &path[..i + 1],
        None => "/",
    };
    parent.set_path(parent_path);
    parent.set_query(None);
    parent.set_fragment(None);
    parent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::anonymous("http://127.0.0.1:8280").unwrap()
    }

    #[test]
    fn test_base_url_validation() {
        assert!(Session::anonymous("http://127.0.0.1:8280/").is_ok());
        assert!(Session::anonymous("not a url").is_err());
        assert!(Session::anonymous("ftp://example.com").is_err());
        assert!(Session::anonymous("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_url_for() {
        let s = session();
        assert_eq!(s.url_for("/data/a.txt").unwrap().as_str(), "http://127.0.0.1:8280/data/a.txt");
        assert_eq!(s.url_for("data//a.txt").unwrap().as_str(), "http://127.0.0.1:8280/data/a.txt");
        assert_eq!(s.url_for("/data/").unwrap().as_str(), "http://127.0.0.1:8280/data/");
        assert_eq!(s.url_for("/").unwrap().as_str(), "http://127.0.0.1:8280/");
        assert_eq!(s.url_for("").unwrap().as_str(), "http://127.0.0.1:8280/");
    }

    #[test]
    fn test_url_for_encodes_segments() {
        let s = session();
        let url = s.url_for("/共享/a b#1?.txt").unwrap();
        assert_eq!(url.path(), "/%E5%85%B1%E4%BA%AB/a%20b%231%3F.txt");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_url_for_keeps_base_prefix() {
        let s = Session::anonymous("http://example.com/hfs/").unwrap();
        assert_eq!(s.url_for("x/y").unwrap().as_str(), "http://example.com/hfs/x/y");
    }

    #[test]
    fn test_parent_url() {
        let s = session();
        let parent = |p: &str| parent_url(&s.url_for(p).unwrap()).to_string();
        assert_eq!(parent("/data/a.txt"), "http://127.0.0.1:8280/data/");
        assert_eq!(parent("/data/sub/"), "http://127.0.0.1:8280/data/");
        assert_eq!(parent("/a.txt"), "http://127.0.0.1:8280/");
        assert_eq!(parent("/"), "http://127.0.0.1:8280/");
    }

    #[test]
    fn test_new_session_state() {
        let config = ClientConfig::new("http://127.0.0.1:8280").with_credentials("abct", "abc123");
        let s = Session::new(config).unwrap();
        assert!(!s.is_established());
        assert_eq!(s.credentials().map(|c| c.username()), Some("abct"));
        assert!(s.cookie_header("/").is_none());
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new(AuthMode::Session)
            .query("resume", "0!")
            .queries([("id", "1")])
            .anti_csrf();
        assert_eq!(options.auth_mode(), AuthMode::Session);
        assert_eq!(options.query.len(), 2);
        assert_eq!(options.headers.get(ANTI_CSRF_HEADER).unwrap(), "1");
    }
}
