//! Upload operations.
//!
//! Two transports exist:
//!
//! - **PUT** to `/{folder}/{filename}` with session auth and a `Referer` of
//!   the folder's URL, the way the web interface uploads.
//! - **Multipart POST** to `/{folder}` with the file in the `upload` field.
//!
//! Some deployments map a host onto a configured root and prepend it to every
//! incoming path. A PUT that already names the folder then lands on
//! `/{root}/{folder}/{filename}` and 404s. The PUT transport recovers from this
//! exactly once by retrying at `/{filename}`; any outcome of that second
//! attempt is final.

use std::path::PathBuf;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method, Url};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::utils::{
    decoded_last_segment, decoded_path, folder_path, join_path, trim_slashes, with_stored_name,
};
use crate::error::{HfsError, Result};
use crate::session::{AuthMode, RawResponse, RequestBody, RequestOptions, Session};

/// `resume` value that starts a fresh upload.
pub const DEFAULT_RESUME: &str = "0!";

/// Multipart field carrying the file content.
pub const MULTIPART_FIELD: &str = "upload";

/// Read size when streaming a file body.
const STREAM_CHUNK: usize = 1024 * 1024;

/// Where upload content comes from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A local file, streamed from disk and reopened for every attempt.
    Path(PathBuf),
    Memory(Bytes),
}

impl FileSource {
    /// Open a fresh request body and its length.
    pub(crate) async fn open(&self) -> Result<(Body, u64)> {
        match self {
            FileSource::Memory(bytes) => Ok((Body::from(bytes.clone()), bytes.len() as u64)),
            FileSource::Path(path) => {
                let io_err = |e| HfsError::io(path.display().to_string(), e);
                let file = tokio::fs::File::open(path).await.map_err(io_err)?;
                let len = file.metadata().await.map_err(io_err)?.len();
                let stream = ReaderStream::with_capacity(file, STREAM_CHUNK);
                Ok((Body::wrap_stream(stream), len))
            }
        }
    }
}

impl From<Bytes> for FileSource {
    fn from(bytes: Bytes) -> Self {
        FileSource::Memory(bytes)
    }
}

/// Query parameters of a PUT upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParams {
    /// Continuation marker; `0!` starts fresh.
    pub resume: String,
    /// Client-side upload id.
    pub id: Option<String>,
    /// Modification time to store, in milliseconds since the epoch.
    pub mtime: Option<i64>,
    /// Additional pairs passed through verbatim.
    pub extra: Vec<(String, String)>,
}

impl Default for PutParams {
    fn default() -> Self {
        Self {
            resume: DEFAULT_RESUME.to_string(),
            id: None,
            mtime: None,
            extra: Vec::new(),
        }
    }
}

impl PutParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(3 + self.extra.len());
        if let Some(id) = &self.id {
            query.push(("id".to_string(), id.clone()));
        }
        if let Some(mtime) = self.mtime {
            query.push(("mtime".to_string(), mtime.to_string()));
        }
        query.push(("resume".to_string(), self.resume.clone()));
        query.extend(self.extra.iter().cloned());
        query
    }
}

/// Upload transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStrategy {
    /// POST `/{folder}` with a multipart body.
    #[default]
    Multipart,
    /// PUT `/{folder}/{filename}` with path-prefix recovery.
    Put(PutParams),
}

impl UploadStrategy {
    /// PUT with default parameters.
    pub fn put() -> Self {
        UploadStrategy::Put(PutParams::default())
    }

    /// Auth mode each transport needs. Basic alone is rejected on the PUT
    /// write path by some deployments.
    pub fn default_auth(&self) -> AuthMode {
        match self {
            UploadStrategy::Put(_) => AuthMode::Session,
            UploadStrategy::Multipart => AuthMode::Either,
        }
    }
}

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Destination folder, e.g. "" (root), "data" or "data/sub".
    pub folder: String,
    /// Name to store; may contain `/` to create subfolders.
    pub filename: String,
    pub content: FileSource,
    pub strategy: UploadStrategy,
    pub auth: AuthMode,
    pub cancel: Option<CancellationToken>,
}

impl UploadRequest {
    /// Multipart upload of `content` into `folder`.
    pub fn new(folder: &str, filename: &str, content: impl Into<Bytes>) -> Self {
        Self::with_source(folder, filename, FileSource::Memory(content.into()))
    }

    /// Multipart upload of the local file at `path`, streamed from disk.
    pub fn from_path(folder: &str, filename: &str, path: impl Into<PathBuf>) -> Self {
        Self::with_source(folder, filename, FileSource::Path(path.into()))
    }

    pub fn with_source(folder: &str, filename: &str, content: FileSource) -> Self {
        let strategy = UploadStrategy::default();
        Self {
            folder: folder.to_string(),
            filename: filename.to_string(),
            content,
            auth: strategy.default_auth(),
            strategy,
            cancel: None,
        }
    }

    /// Switch transport; also resets the auth mode to the transport's default.
    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.auth = strategy.default_auth();
        self.strategy = strategy;
        self
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_cancel(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Name actually stored; differs from the request when the server renamed
    /// the file to avoid a collision.
    pub filename: String,
    /// URL of the stored resource.
    pub url: Url,
    /// Whether the root-relative fallback PUT was used.
    pub used_fallback: bool,
}

/// Fields the server may report after an upload.
#[derive(Debug, Default, Deserialize)]
struct StoredUri {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    uris: Option<Vec<String>>,
}

impl StoredUri {
    fn from_body(body: &[u8]) -> Option<String> {
        let parsed: StoredUri = serde_json::from_slice(body).ok()?;
        parsed
            .uri
            .or_else(|| parsed.uris.and_then(|u| u.into_iter().next()))
            .filter(|u| !u.is_empty())
    }
}

/// States of the PUT path-prefix recovery.
enum PutState {
    AttemptPrimary,
    AttemptFallback,
    Done {
        response: RawResponse,
        path: String,
        used_fallback: bool,
    },
    Failed(HfsError),
}

impl Session {
    /// Upload one file.
    ///
    /// # Example
    /// ```no_run
    /// # use hfsapi::{Session, UploadRequest, UploadStrategy};
    /// # async fn example(session: &Session) -> hfsapi::Result<()> {
    /// let request = UploadRequest::new("data", "a.txt", &b"hi"[..])
    ///     .with_strategy(UploadStrategy::put());
    /// let outcome = session.upload_file(request).await?;
    /// println!("stored as {}", outcome.filename);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_file(&self, request: UploadRequest) -> Result<UploadOutcome> {
        if trim_slashes(&request.filename).is_empty() {
            return Err(HfsError::InvalidArgument(
                "Upload filename must not be empty".to_string(),
            ));
        }

        match &request.strategy {
            UploadStrategy::Put(params) => self.upload_put(&request, params).await,
            UploadStrategy::Multipart => self.upload_multipart(&request).await,
        }
    }

    async fn upload_put(&self, request: &UploadRequest, params: &PutParams) -> Result<UploadOutcome> {
        let folder = trim_slashes(&request.folder);
        let filename = trim_slashes(&request.filename);
        let primary = join_path(folder, filename);
        let fallback = join_path("", filename);
        let referer = self.url_for(&folder_path(folder))?;

        let mut state = PutState::AttemptPrimary;
        loop {
            state = match state {
                PutState::AttemptPrimary => {
                    match self.put_once(&primary, request, params, &referer).await {
                        Ok(response) => PutState::Done {
                            response,
                            path: primary.clone(),
                            used_fallback: false,
                        },
                        // In the root folder the fallback path is the primary path.
                        Err(e) if e.is_not_found() && !folder.is_empty() => PutState::AttemptFallback,
                        Err(e) => PutState::Failed(e),
                    }
                }
                PutState::AttemptFallback => {
                    if request.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                        PutState::Failed(HfsError::Cancelled)
                    } else {
                        warn!(
                            primary = %primary,
                            fallback = %fallback,
                            "PUT returned 404, retrying root-relative path"
                        );
                        match self.put_once(&fallback, request, params, &referer).await {
                            Ok(response) => PutState::Done {
                                response,
                                path: fallback.clone(),
                                used_fallback: true,
                            },
                            Err(e) => PutState::Failed(e),
                        }
                    }
                }
                PutState::Done {
                    response,
                    path,
                    used_fallback,
                } => return self.resolve_outcome(&response, &path, filename, used_fallback),
                PutState::Failed(e) => return Err(e),
            };
        }
    }

    async fn put_once(
        &self,
        path: &str,
        request: &UploadRequest,
        params: &PutParams,
        referer: &Url,
    ) -> Result<RawResponse> {
        let url = self.url_for(path)?;
        let (body, len) = request.content.open().await?;
        let options = RequestOptions::new(request.auth)
            .queries(params.to_query())
            .anti_csrf()
            .referer(referer.clone())
            .body(RequestBody::Stream { body, len })
            .cancel(request.cancel.clone());

        self.request_url(Method::PUT, url, options).await
    }

    async fn upload_multipart(&self, request: &UploadRequest) -> Result<UploadOutcome> {
        let folder = trim_slashes(&request.folder);
        let filename = trim_slashes(&request.filename);
        let target = format!("/{}", folder);

        let (body, len) = request.content.open().await?;
        let part = Part::stream_with_length(body, len)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| HfsError::InvalidArgument(format!("Invalid part: {}", e)))?;
        // Raw UTF-8 filename; `sub/name` keeps its slash.
        let form = Form::new().percent_encode_noop().part(MULTIPART_FIELD, part);

        let options = RequestOptions::new(request.auth)
            .anti_csrf()
            .body(RequestBody::Multipart(form))
            .cancel(request.cancel.clone());

        let response = self.request(Method::POST, &target, options).await?;
        self.resolve_outcome(&response, &join_path(folder, filename), filename, false)
    }

    /// Work out the stored name from the response, echoing the requested
    /// name when the server does not report one.
    fn resolve_outcome(
        &self,
        response: &RawResponse,
        path: &str,
        requested: &str,
        used_fallback: bool,
    ) -> Result<UploadOutcome> {
        let stored = StoredUri::from_body(&response.body);
        let filename = stored
            .as_deref()
            .and_then(decoded_last_segment)
            .map(|name| with_stored_name(requested, &name))
            .unwrap_or_else(|| requested.to_string());

        // Server-relative URIs are placed under the base URL's own path.
        let url = match stored.as_deref() {
            Some(uri) => match Url::parse(uri) {
                Ok(absolute) => absolute,
                Err(_) => self.url_for(&decoded_path(uri))?,
            },
            None => self.url_for(path)?,
        };

        debug!(requested, stored = %filename, url = %url, "upload complete");
        Ok(UploadOutcome {
            filename,
            url,
            used_fallback,
        })
    }
}
