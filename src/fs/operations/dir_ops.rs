//! Folder creation, deletion and directory uploads.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::{Method, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::upload::{FileSource, UploadOutcome, UploadRequest, UploadStrategy};
use super::utils::{join_path, trim_slashes};
use crate::error::{HfsError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::session::{parent_url, AuthMode, RequestOptions, Session};

/// Empty file written to create a folder.
pub const FOLDER_PLACEHOLDER: &str = ".keep";

impl Session {
    /// Create `name` inside `parent` and return the new folder's URL.
    ///
    /// Writes an empty `{name}/.keep` over PUT, so the same path-prefix
    /// recovery as [`Session::upload_file`] applies. The server creates the
    /// intermediate folder. An existing folder is not an error on servers
    /// that accept overwrites; a conflict is surfaced as returned.
    pub async fn create_folder(&self, parent: &str, name: &str) -> Result<Url> {
        self.create_folder_with(parent, name, UploadStrategy::put())
            .await
    }

    /// [`Session::create_folder`] with an explicit transport.
    pub async fn create_folder_with(
        &self,
        parent: &str,
        name: &str,
        strategy: UploadStrategy,
    ) -> Result<Url> {
        let name = trim_slashes(name);
        if name.is_empty() {
            return Err(HfsError::InvalidArgument(
                "Folder name must not be empty".to_string(),
            ));
        }

        let placeholder = format!("{}/{}", name, FOLDER_PLACEHOLDER);
        let request = UploadRequest::new(parent, &placeholder, Bytes::new()).with_strategy(strategy);
        let outcome = self.upload_file(request).await?;

        let folder = parent_url(&outcome.url);
        info!(parent, name, url = %folder, "folder created");
        Ok(folder)
    }

    /// Delete `filename` from `folder`.
    pub async fn delete_file(&self, folder: &str, filename: &str) -> Result<()> {
        if trim_slashes(filename).is_empty() {
            return Err(HfsError::InvalidArgument(
                "Cannot delete without a filename".to_string(),
            ));
        }

        let path = join_path(folder, filename);
        self.request(
            Method::DELETE,
            &path,
            RequestOptions::new(AuthMode::Either).anti_csrf(),
        )
        .await?;

        info!(path = %path, "deleted");
        Ok(())
    }

    /// Upload many files into `folder`, keeping their relative paths.
    ///
    /// Files go in lexicographic order of relative path. With `workers > 1`
    /// up to that many uploads run at once; results are still reported in
    /// order. A failed file is recorded in the report and the batch goes on.
    /// Cancelling the token, or a progress callback returning `false`,
    /// stops the batch with [`HfsError::Cancelled`].
    pub async fn upload_directory(
        &self,
        folder: &str,
        mut files: Vec<LocalFile>,
        options: DirectoryUploadOptions,
    ) -> Result<DirectoryUploadReport> {
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let DirectoryUploadOptions {
            strategy,
            workers,
            cancel,
            mut progress,
        } = options;
        let workers = workers.max(1);
        let total = files.len() as u64;
        let mut report = DirectoryUploadReport::default();

        debug!(folder, total, workers, "starting directory upload");

        let mut uploads = stream::iter(files)
            .map(|file| {
                let strategy = strategy.clone();
                let cancel = cancel.clone();
                async move {
                    let request = UploadRequest::with_source(folder, &file.relative_path, file.source)
                        .with_strategy(strategy)
                        .with_cancel(cancel);
                    let result = self.upload_file(request).await;
                    (file.relative_path, result)
                }
            })
            .buffered(workers);

        while let Some((relative_path, result)) = uploads.next().await {
            if cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(HfsError::Cancelled);
            }

            match result {
                Ok(outcome) => report.uploaded.push(outcome),
                Err(e) => {
                    warn!(file = %relative_path, error = %e, "upload failed");
                    report.failed.push((relative_path.clone(), e));
                }
            }

            let done = (report.uploaded.len() + report.failed.len()) as u64;
            if let Some(callback) = progress.as_mut() {
                if !callback(&TransferProgress::new(done, total, relative_path)) {
                    return Err(HfsError::Cancelled);
                }
            }
        }

        info!(
            folder,
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "directory upload finished"
        );
        Ok(report)
    }

    /// Collect `dir` and upload it into `folder`.
    pub async fn upload_local_dir(
        &self,
        folder: &str,
        dir: impl AsRef<Path>,
        options: DirectoryUploadOptions,
    ) -> Result<DirectoryUploadReport> {
        let files = LocalFile::collect(dir).await?;
        self.upload_directory(folder, files, options).await
    }
}

/// A file queued for a directory upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// Path below the upload folder, `/`-separated.
    pub relative_path: String,
    pub source: FileSource,
}

impl LocalFile {
    pub fn from_bytes(relative_path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: FileSource::Memory(content.into()),
        }
    }

    pub fn from_path(relative_path: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: FileSource::Path(path.into()),
        }
    }

    /// Walk `dir` recursively and return every regular file in it.
    ///
    /// Relative paths use `/` whatever the platform. Symlinks are skipped.
    pub async fn collect(dir: impl AsRef<Path>) -> Result<Vec<LocalFile>> {
        let root = dir.as_ref();
        let mut files = Vec::new();
        let mut pending = vec![(root.to_path_buf(), String::new())];

        while let Some((path, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&path)
                .await
                .map_err(|e| HfsError::io(path.display().to_string(), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| HfsError::io(path.display().to_string(), e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| HfsError::io(entry.path().display().to_string(), e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let relative = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };

                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() {
                    files.push(LocalFile::from_path(relative, entry.path()));
                }
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}

/// Options for [`Session::upload_directory`].
pub struct DirectoryUploadOptions {
    pub strategy: UploadStrategy,
    /// Concurrent uploads; 1 uploads one file at a time.
    pub workers: usize,
    pub cancel: Option<CancellationToken>,
    /// Called after each file.
    pub progress: Option<ProgressCallback>,
}

impl Default for DirectoryUploadOptions {
    fn default() -> Self {
        Self {
            strategy: UploadStrategy::put(),
            workers: 1,
            cancel: None,
            progress: None,
        }
    }
}

impl std::fmt::Debug for DirectoryUploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryUploadOptions")
            .field("strategy", &self.strategy)
            .field("workers", &self.workers)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl DirectoryUploadOptions {
    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

/// Outcome of a directory upload.
#[derive(Debug, Default)]
pub struct DirectoryUploadReport {
    pub uploaded: Vec<UploadOutcome>,
    /// Relative path and error of each file that failed.
    pub failed: Vec<(String, HfsError)>,
}

impl DirectoryUploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deep")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/deep/c.txt"), b"c").unwrap();

        let files = LocalFile::collect(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/deep/c.txt"]);

        match &files[2].source {
            FileSource::Path(path) => assert_eq!(path, &dir.path().join("sub/deep/c.txt")),
            other => panic!("expected a path source, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_collect_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFile::collect(dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, HfsError::Io { .. }));
    }

    #[tokio::test]
    async fn test_empty_folder_name_rejected() {
        let session = Session::anonymous("http://127.0.0.1:9").unwrap();
        let err = session.create_folder("data", "/").await.unwrap_err();
        assert!(matches!(err, HfsError::InvalidArgument(_)));
        let err = session.delete_file("data", "").await.unwrap_err();
        assert!(matches!(err, HfsError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_options() {
        let options = DirectoryUploadOptions::default();
        assert_eq!(options.workers, 1);
        assert_eq!(options.strategy, UploadStrategy::put());
        assert!(DirectoryUploadReport::default().is_complete());
    }
}
