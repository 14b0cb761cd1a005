//! # hfsapi
//!
//! Rust client library for HFS (HTTP File Server).
//!
//! ## Features
//!
//! - **Authentication**: HTTP Basic or a cookie session obtained by logging in
//!   once. The session cookie is reused so the password is not resent.
//! - **Listing**: Paged directory listings with per-entry permissions resolved
//!   against the folder's own capability flags.
//! - **Uploads**:
//!   - PUT or multipart POST transports.
//!   - Automatic recovery when a reverse-mapped root makes a PUT 404.
//!   - Directory uploads, sequential or with a bounded number of workers.
//! - **Folders**: Create and delete.
//! - **Admin API**: Read and write server config, inspect the VFS tree and
//!   accounts.
//!
//! Every network-bound operation can be cancelled with a
//! [`tokio_util::sync::CancellationToken`].
//!
//! ## Example
//!
//! ```no_run
//! use hfsapi::{ClientConfig, ListOptions, Session, UploadRequest, UploadStrategy};
//!
//! # async fn example() -> hfsapi::Result<()> {
//! let config = ClientConfig::new("http://127.0.0.1:8280").with_credentials("abct", "abc123");
//! let session = Session::new(config)?;
//!
//! let listing = session.list_directory("/data", ListOptions::default()).await?;
//! for entry in &listing.entries {
//!     println!("{} ({} bytes)", entry.name, entry.size_or_zero());
//! }
//!
//! let request = UploadRequest::new("data", "a.txt", &b"hello"[..])
//!     .with_strategy(UploadStrategy::put());
//! let outcome = session.upload_file(request).await?;
//! println!("stored as {}", outcome.filename);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod progress;
pub mod session;

// Re-export commonly used types
pub use api::{Account, ConfigFilter, VfsNode, Who};
pub use config::ClientConfig;
pub use error::{HfsError, Result};
pub use fs::{
    split_remote_path, Capabilities, DirectoryEntry, DirectoryFlags, DirectoryListing,
    DirectoryUploadOptions, DirectoryUploadReport, EntryKind, FileSource, ListOptions, LocalFile,
    PutParams, UploadOutcome, UploadRequest, UploadStrategy,
};
pub use progress::{ProgressCallback, TransferProgress};
pub use session::{
    AuthMode, CredentialStore, Credentials, FileCredentialStore, Session, StoredCredentials,
};
