//! Path helpers
//!
//! Tree ids are normalized remote paths: segments separated by `/`, a single
//! leading `/`, no empty segments.

/// Separator between path segments
pub const SEPARATOR: char = '/';

/// Split a path into its non-empty segments
///
/// # Examples
/// ```
/// # use paramcache::tree::path::segments;
/// assert_eq!(segments("/a//b/"), vec!["a", "b"]);
/// assert!(segments("/").is_empty());
/// ```
#[must_use]
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Normalize a path into id form
///
/// # Examples
/// ```
/// # use paramcache::tree::path::normalize;
/// assert_eq!(normalize("a//b/"), "/a/b");
/// assert_eq!(normalize(""), "/");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    join(&segments(path))
}

/// Build an id from segments
#[must_use]
pub fn join(segments: &[&str]) -> String {
    let mut id = String::new();
    for segment in segments {
        id.push(SEPARATOR);
        id.push_str(segment);
    }
    if id.is_empty() {
        id.push(SEPARATOR);
    }
    id
}

/// Id of a child below `parent`
///
/// `parent` is `None` at the root.
#[must_use]
pub fn child_id(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if parent != "/" => format!("{parent}{SEPARATOR}{name}"),
        _ => format!("{SEPARATOR}{name}"),
    }
}

/// Last segment of a path
#[must_use]
pub fn name_of(path: &str) -> &str {
    path.rsplit(SEPARATOR).find(|s| !s.is_empty()).unwrap_or_default()
}

/// Id of the parent folder, `None` for root-level nodes
#[must_use]
pub fn parent_of(path: &str) -> Option<String> {
    let segs = segments(path);
    match segs.split_last() {
        Some((_, parents)) if !parents.is_empty() => Some(join(parents)),
        _ => None,
    }
}

/// Whether `path` lies at or below `prefix`, on segment boundaries
///
/// # Examples
/// ```
/// # use paramcache::tree::path::is_within;
/// assert!(is_within("/app/db/host", "/app"));
/// assert!(!is_within("/application/x", "/app"));
/// assert!(is_within("/anything", "/"));
/// ```
#[must_use]
pub fn is_within(path: &str, prefix: &str) -> bool {
    let prefix = segments(prefix);
    let path = segments(path);
    path.len() >= prefix.len() && path.iter().zip(&prefix).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_id_at_root_and_below() {
        assert_eq!(child_id(None, "a"), "/a");
        assert_eq!(child_id(Some("/"), "a"), "/a");
        assert_eq!(child_id(Some("/a"), "b"), "/a/b");
    }

    #[test]
    fn test_name_and_parent() {
        assert_eq!(name_of("/a/b/c"), "c");
        assert_eq!(name_of("/a/b/"), "b");
        assert_eq!(parent_of("/a/b/c").as_deref(), Some("/a/b"));
        assert_eq!(parent_of("/a"), None);
    }

    #[test]
    fn test_normalize_is_stable() {
        let once = normalize("x/y//z");
        assert_eq!(once, "/x/y/z");
        assert_eq!(normalize(&once), once);
    }
}
