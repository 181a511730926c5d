// src/watch/fingerprint.rs

//! Content fingerprints of the artifact tree.
//!
//! A rebuild that rewrites files with identical bytes (or only touches
//! excluded bookkeeping files) produces the same fingerprint, which lets the
//! reload runtime skip a pointless reload when `skip_unchanged` is on.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::{FileSystem, walk_files};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::ExcludeFilter;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprint every non-excluded file under `root`.
///
/// Both the relative path and the content hash of each file go into the
/// aggregate, so renames change the fingerprint too. Files are visited in
/// sorted order, keeping the result independent of directory order.
pub fn tree_fingerprint(fs: &dyn FileSystem, root: &Path, exclude: &ExcludeFilter) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut count = 0usize;

    for path in walk_files(fs, root)? {
        let Some(rel) = relative_str(root, &path) else {
            continue;
        };
        if exclude.is_excluded(&rel) {
            continue;
        }
        let file_hash = compute_file_hash(fs, &path)?;
        hasher.update(rel.as_bytes());
        hasher.update(&[0]);
        hasher.update(file_hash.as_bytes());
        count += 1;
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(root = ?root, files = count, hash = %hash, "computed tree fingerprint");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn tree() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("out/libapp.so", "code-v1");
        fs.add_file("out/deps/libapp.d", "deps");
        fs
    }

    #[test]
    fn identical_trees_have_identical_fingerprints() {
        let a = tree_fingerprint(&tree(), Path::new("out"), &ExcludeFilter::none()).unwrap();
        let b = tree_fingerprint(&tree(), Path::new("out"), &ExcludeFilter::none()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn content_change_changes_fingerprint() {
        let fs = tree();
        let before = tree_fingerprint(&fs, Path::new("out"), &ExcludeFilter::none()).unwrap();
        fs.add_file("out/libapp.so", "code-v2");
        let after = tree_fingerprint(&fs, Path::new("out"), &ExcludeFilter::none()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn excluded_files_do_not_count() {
        let exclude = ExcludeFilter::new(&["**/*.d".to_string()]).unwrap();
        let fs = tree();
        let before = tree_fingerprint(&fs, Path::new("out"), &exclude).unwrap();
        fs.add_file("out/deps/libapp.d", "other deps");
        let after = tree_fingerprint(&fs, Path::new("out"), &exclude).unwrap();
        assert_eq!(before, after);
    }
}
