// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::watch::path_utils::relative_str;

/// Compiled `[watch].exclude` patterns.
///
/// Patterns are evaluated against paths relative to the watched root with
/// forward slashes, e.g. `"deps/libapp.d"` against `"**/*.d"`.
#[derive(Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeFilter")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl ExcludeFilter {
    /// A filter that excludes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(patterns: &[String]) -> Result<Self> {
        let set = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(patterns).context("building exclude globset")?)
        };
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True if the relative path `rel_path` matches any exclude pattern.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(rel_path))
    }

    /// Like [`is_excluded`](Self::is_excluded) for an absolute path below
    /// `root`. Paths outside `root` are never excluded.
    pub fn is_excluded_path(&self, root: &Path, path: &Path) -> bool {
        if self.set.is_none() {
            return false;
        }
        relative_str(root, path).is_some_and(|rel| self.is_excluded(&rel))
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_excludes_nothing() {
        let filter = ExcludeFilter::none();
        assert!(!filter.is_excluded("anything.so"));
    }

    #[test]
    fn patterns_match_relative_paths() {
        let filter =
            ExcludeFilter::new(&["**/*.d".to_string(), "**/.fingerprint/**".to_string()]).unwrap();
        assert!(filter.is_excluded("deps/libapp.d"));
        assert!(filter.is_excluded("debug/.fingerprint/app-1/out"));
        assert!(!filter.is_excluded("libapp.so"));
        assert!(filter.is_excluded_path(Path::new("/t"), Path::new("/t/x/y.d")));
        assert!(!filter.is_excluded_path(Path::new("/t"), Path::new("/elsewhere/y.so")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(ExcludeFilter::new(&["a[".to_string()]).is_err());
    }
}
