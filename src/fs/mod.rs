//! Remote filesystem model and operations.

pub(crate) mod entry;
mod operations;
pub mod permissions;

pub use entry::{DirectoryEntry, DirectoryListing, EntryKind};
pub use operations::{
    split_remote_path, DirectoryUploadOptions, DirectoryUploadReport, FileSource, ListOptions,
    LocalFile, PutParams, UploadOutcome, UploadRequest, UploadStrategy, DEFAULT_RESUME,
    FOLDER_PLACEHOLDER, MULTIPART_FIELD,
};
pub use permissions::{Capabilities, DirectoryFlags};
