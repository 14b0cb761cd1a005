//! Directory entries as returned by a listing.

use serde::{Deserialize, Serialize};

use super::permissions::{Capabilities, DirectoryFlags};
use crate::error::{HfsError, Result};

/// Entry kind. Folder names come back from the server with a trailing `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Folder,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Name without the trailing `/` folders carry on the wire.
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes; folders usually have none.
    pub size: Option<u64>,
    /// Creation time (ISO 8601), only when requested.
    pub created: Option<String>,
    /// Modification time (ISO 8601).
    pub modified: Option<String>,
    /// Raw permission marker, present only where it differs from the parent.
    pub marker: Option<String>,
    pub comment: Option<String>,
    /// Marker overlaid on the directory's flags.
    pub permissions: Capabilities,
}

impl DirectoryEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Size with folders and missing values counted as zero.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

/// A page of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub entries: Vec<DirectoryEntry>,
    /// Capabilities of the current credential on the directory itself.
    pub flags: DirectoryFlags,
}

impl DirectoryListing {
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        let name = name.trim_end_matches('/');
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Listing payload as sent by the server.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingPayload {
    #[serde(flatten)]
    flags: DirectoryFlags,
    #[serde(default)]
    list: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    n: String,
    #[serde(default)]
    s: Option<serde_json::Number>,
    #[serde(default)]
    c: Option<String>,
    #[serde(default)]
    m: Option<String>,
    #[serde(default)]
    p: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

impl RawEntry {
    fn into_entry(self, inherited: Capabilities) -> DirectoryEntry {
        let kind = if self.n.ends_with('/') {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        let size = self
            .s
            .and_then(|n| n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)));
        let permissions = Capabilities::resolve(self.p.as_deref(), inherited);

        DirectoryEntry {
            name: self.n.trim_end_matches('/').to_string(),
            kind,
            size,
            created: self.c,
            modified: self.m,
            marker: self.p,
            comment: self.comment,
            permissions,
        }
    }
}

impl ListingPayload {
    /// Validate the payload and resolve every entry against the directory flags.
    pub(crate) fn into_listing(self) -> Result<DirectoryListing> {
        let list = self
            .list
            .ok_or_else(|| HfsError::Protocol("Listing response has no `list` field".to_string()))?;
        let inherited = self.flags.inherited();
        Ok(DirectoryListing {
            entries: list.into_iter().map(|e| e.into_entry(inherited)).collect(),
            flags: self.flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DirectoryListing> {
        serde_json::from_str::<ListingPayload>(json)
            .unwrap()
            .into_listing()
    }

    #[test]
    fn test_parse_listing() {
        let listing = parse(
            r#"{
                "can_archive": true, "can_upload": true, "can_delete": false,
                "list": [
                    {"n": "sub/", "c": "2024-01-01T00:00:00.000Z"},
                    {"n": "a.txt", "s": 12, "m": "2024-01-02T00:00:00.000Z"},
                    {"n": "locked.bin", "s": 3.0, "p": "d"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(listing.len(), 3);
        assert_eq!(listing.names(), vec!["sub", "a.txt", "locked.bin"]);

        let sub = listing.find("sub/").unwrap();
        assert!(sub.is_folder());
        assert_eq!(sub.size, None);
        assert_eq!(sub.permissions, listing.flags.inherited());

        let a = listing.find("a.txt").unwrap();
        assert!(a.is_file());
        assert_eq!(a.size_or_zero(), 12);
        assert!(a.created.is_none());
        assert!(a.modified.is_some());

        let locked = listing.find("locked.bin").unwrap();
        assert_eq!(locked.size, Some(3));
        assert_eq!(locked.marker.as_deref(), Some("d"));
        assert!(locked.permissions.can_delete);
    }

    #[test]
    fn test_missing_list_is_protocol_error() {
        let err = parse(r#"{"can_archive": true}"#).unwrap_err();
        assert!(matches!(err, HfsError::Protocol(_)));
    }

    #[test]
    fn test_empty_list() {
        let listing = parse(r#"{"list": []}"#).unwrap();
        assert!(listing.is_empty());
        assert!(listing.flags.can_list);
    }
}
