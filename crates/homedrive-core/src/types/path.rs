//! Materialized absolute path algebra.
//!
//! Every node in a drive is addressed by a slash-delimited absolute path
//! rooted at one of the virtual roots (`/home`, `/trash`). Prefix tests
//! are always segment-aware: `/home/A` is an ancestor of `/home/A/B` but
//! not of `/home/AB`.

use crate::error::AppError;
use crate::result::AppResult;

/// Path of the virtual home root.
pub const HOME_PATH: &str = "/home";
/// Path of the virtual trash root.
pub const TRASH_PATH: &str = "/trash";
/// Path separator.
pub const SEPARATOR: char = '/';

/// Append a single name segment to a parent path.
pub fn join(parent: &str, name: &str) -> String {
    format!("{parent}{SEPARATOR}{name}")
}

/// Whether `path` lies strictly below `ancestor` on a segment boundary.
pub fn is_strict_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// Whether `path` equals `ancestor` or lies below it on a segment boundary.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor || is_strict_descendant(path, ancestor)
}

/// Replace the `old_root` prefix of `path` with `new_root`.
///
/// Returns `None` when `path` is not within `old_root`.
pub fn rebase(path: &str, old_root: &str, new_root: &str) -> Option<String> {
    is_within(path, old_root).then(|| format!("{new_root}{}", &path[old_root.len()..]))
}

/// The path obtained by replacing the last segment of `path` with `new_name`.
pub fn with_name(path: &str, new_name: &str) -> String {
    match path.rfind(SEPARATOR) {
        Some(idx) => join(&path[..idx], new_name),
        None => join("", new_name),
    }
}

/// Whether a path is addressable by resolution: it must live under
/// `/home` and must not reach into `/trash`.
pub fn is_addressable(path: &str) -> bool {
    !path.starts_with(TRASH_PATH) && is_within(path, HOME_PATH)
}

/// Validate a single folder or file name.
pub fn validate_name(name: &str, max_len: usize) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_path("Name cannot be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(AppError::invalid_path(format!(
            "Name '{name}' must not contain '{SEPARATOR}'"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::invalid_path(format!("Name '{name}' is reserved")));
    }
    if name.chars().count() > max_len {
        return Err(AppError::invalid_path(format!(
            "Name exceeds {max_len} characters"
        )));
    }
    Ok(())
}
