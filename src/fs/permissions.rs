//! Permission markers and their inheritance.
//!
//! A listing carries directory-level flags for the current credential plus,
//! on some entries, a compact marker such as `"rL"` or `"d"`. The marker is
//! only present where the entry differs from its parent, so decoding is a
//! one-level overlay of the marker on the parent's capabilities.

use serde::{Deserialize, Serialize};

/// Resolved capability set for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// May download this node.
    pub can_read: bool,
    /// Read permission propagates to descendants.
    pub can_read_recursive: bool,
    /// May list this node.
    pub can_list: bool,
    /// List permission propagates to descendants.
    pub can_list_recursive: bool,
    /// May delete, rename or move this node.
    pub can_delete: bool,
}

impl Capabilities {
    /// Overlay `marker` on `parent`.
    ///
    /// Lower-case letters grant the capability for this node only, upper-case
    /// letters grant it for this node and its descendants. Letters that are
    /// absent leave the parent's value in place. Unknown characters are skipped.
    ///
    /// | letter | effect                                   |
    /// |--------|------------------------------------------|
    /// | `r`    | `can_read`, not `can_read_recursive`     |
    /// | `R`    | `can_read` and `can_read_recursive`      |
    /// | `l`    | `can_list`, not `can_list_recursive`     |
    /// | `L`    | `can_list` and `can_list_recursive`      |
    /// | `d`/`D`| `can_delete`                             |
    pub fn resolve(marker: Option<&str>, parent: Capabilities) -> Capabilities {
        let Some(marker) = marker else {
            return parent;
        };

        let has = |c: char| marker.contains(c);
        let mut resolved = parent;

        if has('R') {
            resolved.can_read = true;
            resolved.can_read_recursive = true;
        } else if has('r') {
            resolved.can_read = true;
            resolved.can_read_recursive = false;
        }

        if has('L') {
            resolved.can_list = true;
            resolved.can_list_recursive = true;
        } else if has('l') {
            resolved.can_list = true;
            resolved.can_list_recursive = false;
        }

        if has('d') || has('D') {
            resolved.can_delete = true;
        }

        resolved
    }
}

/// Directory-level flags returned alongside a listing.
///
/// `can_read` and `can_list` are not sent by current servers; a listing that
/// came back at all was readable and listable, so both default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFlags {
    #[serde(default)]
    pub can_archive: bool,
    #[serde(default)]
    pub can_upload: bool,
    #[serde(default)]
    pub can_delete: bool,
    /// Some servers only grant deletion on the children of a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_delete_children: Option<bool>,
    #[serde(default)]
    pub can_comment: bool,
    #[serde(default)]
    pub can_overwrite: bool,
    #[serde(default = "granted")]
    pub can_read: bool,
    #[serde(default = "granted")]
    pub can_list: bool,
}

fn granted() -> bool {
    true
}

impl Default for DirectoryFlags {
    fn default() -> Self {
        Self {
            can_archive: false,
            can_upload: false,
            can_delete: false,
            can_delete_children: None,
            can_comment: false,
            can_overwrite: false,
            can_read: true,
            can_list: true,
        }
    }
}

impl DirectoryFlags {
    /// Capabilities every entry of this directory inherits.
    pub fn inherited(&self) -> Capabilities {
        Capabilities {
            can_read: self.can_read,
            can_read_recursive: self.can_read,
            can_list: self.can_list,
            can_list_recursive: self.can_list,
            can_delete: self.can_delete_children.unwrap_or(self.can_delete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> Capabilities {
        Capabilities {
            can_read: true,
            can_read_recursive: true,
            can_list: false,
            can_list_recursive: false,
            can_delete: false,
        }
    }

    #[test]
    fn test_absent_marker_inherits_exactly() {
        assert_eq!(Capabilities::resolve(None, parent()), parent());
        let none = Capabilities::default();
        assert_eq!(Capabilities::resolve(None, none), none);
    }

    #[test]
    fn test_empty_marker_inherits() {
        assert_eq!(Capabilities::resolve(Some(""), parent()), parent());
    }

    #[test]
    fn test_upper_case_sets_recursive() {
        let resolved = Capabilities::resolve(Some("L"), parent());
        assert!(resolved.can_list);
        assert!(resolved.can_list_recursive);
        // untouched capabilities come from the parent
        assert!(resolved.can_read_recursive);
        assert!(!resolved.can_delete);

        let none = Capabilities::default();
        let resolved = Capabilities::resolve(Some("R"), none);
        assert!(resolved.can_read && resolved.can_read_recursive);
        assert!(!resolved.can_list && !resolved.can_delete);
    }

    #[test]
    fn test_lower_case_is_node_only() {
        let resolved = Capabilities::resolve(Some("r"), parent());
        assert!(resolved.can_read);
        assert!(!resolved.can_read_recursive);

        let resolved = Capabilities::resolve(Some("ld"), Capabilities::default());
        assert!(resolved.can_list);
        assert!(!resolved.can_list_recursive);
        assert!(resolved.can_delete);
        assert!(!resolved.can_read);
    }

    #[test]
    fn test_unknown_characters_ignored() {
        let resolved = Capabilities::resolve(Some("x?9"), parent());
        assert_eq!(resolved, parent());
        let resolved = Capabilities::resolve(Some("zD"), parent());
        assert!(resolved.can_delete);
    }

    #[test]
    fn test_upper_case_wins_over_lower_case() {
        for marker in ["rR", "Rr"] {
            let resolved = Capabilities::resolve(Some(marker), Capabilities::default());
            assert!(resolved.can_read_recursive, "marker {marker}");
        }
    }

    #[test]
    fn test_never_invents_capabilities() {
        let none = Capabilities::default();
        for marker in ["", "x", "r", "l", "d"] {
            let resolved = Capabilities::resolve(Some(marker), none);
            assert!(!resolved.can_read_recursive);
            assert!(!resolved.can_list_recursive);
        }
    }

    #[test]
    fn test_directory_flags_defaults() {
        let flags: DirectoryFlags =
            serde_json::from_str(r#"{"can_archive":true,"can_upload":true,"can_delete":false}"#)
                .unwrap();
        assert!(flags.can_archive);
        assert!(flags.can_read && flags.can_list);
        let inherited = flags.inherited();
        assert!(inherited.can_read_recursive);
        assert!(!inherited.can_delete);
    }

    #[test]
    fn test_delete_children_overrides() {
        let flags: DirectoryFlags =
            serde_json::from_str(r#"{"can_delete":false,"can_delete_children":true}"#).unwrap();
        assert!(flags.inherited().can_delete);
    }
}
