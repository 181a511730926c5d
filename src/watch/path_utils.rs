// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// We first try a direct `strip_prefix(root)`. If that fails (symlinks,
/// `/private/var` vs `/var` on macOS) both paths are canonicalized and we
/// try again. A path that no longer exists cannot be canonicalized, so for
/// removals only the first attempt can succeed.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        assert_eq!(
            relative_str(Path::new("/a/b"), Path::new("/a/b/c/d.so")).as_deref(),
            Some("c/d.so")
        );
        assert_eq!(relative_str(Path::new("/a/b"), Path::new("/a/b")).as_deref(), Some(""));
    }

    #[test]
    fn unrelated_missing_path_is_none() {
        assert_eq!(
            relative_str(Path::new("/definitely/not/here"), Path::new("/nor/here")),
            None
        );
    }
}
