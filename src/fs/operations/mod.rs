//! Filesystem operations split into focused modules.

mod browse;
mod dir_ops;
mod upload;
mod utils;

pub use browse::ListOptions;
pub use dir_ops::{DirectoryUploadOptions, DirectoryUploadReport, LocalFile, FOLDER_PLACEHOLDER};
pub use upload::{
    FileSource, PutParams, UploadOutcome, UploadRequest, UploadStrategy, DEFAULT_RESUME, MULTIPART_FIELD,
};
pub use utils::split_remote_path;
