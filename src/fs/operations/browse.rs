//! Directory listing.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::utils::normalize_path;
use crate::api::endpoint;
use crate::error::Result;
use crate::fs::entry::{DirectoryEntry, DirectoryListing, ListingPayload};
use crate::session::{AuthMode, RequestOptions, Session};

/// Caller-driven paging and filtering for [`Session::list_directory`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Number of entries to skip.
    pub offset: Option<u64>,
    /// Maximum number of entries to return.
    pub limit: Option<u64>,
    /// Search term; the server also searches subfolders.
    pub search: Option<String>,
    /// Ask for creation as well as modification timestamps.
    pub include_timestamps: bool,
    pub cancel: Option<CancellationToken>,
}

impl ListOptions {
    pub fn page(offset: u64, limit: u64) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.include_timestamps = true;
        self
    }

    fn to_query(&self, uri: &str) -> Vec<(String, String)> {
        let mut query = vec![("uri".to_string(), uri.to_string())];
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        if self.include_timestamps {
            query.push(("c".to_string(), "1".to_string()));
        }
        query
    }
}

impl Session {
    /// List one page of a directory.
    ///
    /// Offset and limit are passed through verbatim; fetching further pages
    /// is up to the caller. Every entry's permissions are resolved against
    /// the directory flags of this response.
    ///
    /// # Arguments
    /// * `uri` - Directory path (e.g., "/", "/data", "data")
    /// * `options` - Paging, search and timestamp options
    pub async fn list_directory(&self, uri: &str, options: ListOptions) -> Result<DirectoryListing> {
        let uri = normalize_path(uri);
        let request = RequestOptions::new(AuthMode::Either)
            .queries(options.to_query(&uri))
            .cancel(options.cancel.clone());

        let response = self
            .request(Method::GET, &endpoint("get_file_list"), request)
            .await?;
        response.json::<ListingPayload>()?.into_listing()
    }

    /// Entries of a directory with default options.
    pub async fn list_entries(&self, uri: &str) -> Result<Vec<DirectoryEntry>> {
        Ok(self.list_directory(uri, ListOptions::default()).await?.entries)
    }
}
