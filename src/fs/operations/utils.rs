//! Shared helpers for filesystem operations.

use percent_encoding::percent_decode_str;

/// Normalize a path (remove trailing slashes, handle //).
pub(crate) fn normalize_path(path: &str) -> String {
    let mut result = path.replace("//", "/");
    while result.ends_with('/') && result.len() > 1 {
        result.pop();
    }
    if !result.starts_with('/') {
        result = format!("/{}", result);
    }
    result
}

/// Strip leading and trailing slashes.
pub(crate) fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// `/{folder}/{name}`, or `/{name}` for the root folder.
pub(crate) fn join_path(folder: &str, name: &str) -> String {
    let folder = trim_slashes(folder);
    let name = trim_slashes(name);
    if folder.is_empty() {
        format!("/{}", name)
    } else {
        format!("/{}/{}", folder, name)
    }
}

/// Browsable folder path with a trailing slash (`/` for the root).
pub(crate) fn folder_path(folder: &str) -> String {
    let folder = trim_slashes(folder);
    if folder.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", folder)
    }
}

/// Split `data/sub/name` into (`data/sub`, `name`). Leading `/` is optional.
pub fn split_remote_path(path: &str) -> (String, String) {
    let path = trim_slashes(path);
    match path.rsplit_once('/') {
        Some((parent, name)) => (
            trim_slashes(parent).to_string(),
            trim_slashes(name).to_string(),
        ),
        None => (String::new(), path.to_string()),
    }
}

/// Last segment of a server-reported URI, percent-decoded.
pub(crate) fn decoded_last_segment(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or("");
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

/// Path part of a server-reported URI, percent-decoded.
pub(crate) fn decoded_path(uri: &str) -> String {
    let path = uri.split(['?', '#']).next().unwrap_or("");
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Replace the last segment of `requested` with `stored`.
///
/// `sub/a.txt` renamed by the server to `a (1).txt` becomes `sub/a (1).txt`.
pub(crate) fn with_stored_name(requested: &str, stored: &str) -> String {
    match trim_slashes(requested).rsplit_once('/') {
        Some((parent, _)) => format!("{}/{}", parent, stored),
        None => stored.to_string(),
    }
}
