// src/fs/mod.rs

//! Filesystem access used by the watcher registry, the fingerprint gate and
//! the route generator.
//!
//! Everything that walks a tree goes through [`FileSystem`] so that the
//! registration and scanning logic can be exercised against
//! [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return the entries of a directory as full paths, sorted.
    ///
    /// Sorting keeps tree walks (and therefore generated code and
    /// fingerprints) independent of the platform's directory order.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Walk `root` depth-first and return every directory, `root` included.
///
/// Directories that vanish while walking are skipped; the error for the root
/// itself is returned.
pub fn walk_dirs(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if dir.as_path() == root => return Err(err),
            Err(_) => continue,
        };
        // Reverse so the pop order follows the sorted order.
        for path in entries.into_iter().rev() {
            if fs.is_dir(&path) {
                stack.push(path);
            }
        }
        dirs.push(dir);
    }

    Ok(dirs)
}

/// Walk `root` and return every regular file below it, in sorted order.
pub fn walk_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in walk_dirs(fs, root)? {
        let Ok(entries) = fs.read_dir(&dir) else {
            continue;
        };
        files.extend(entries.into_iter().filter(|p| fs.is_file(p)));
    }
    files.sort();
    Ok(files)
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        // Symlinked directories are not followed, so a link cycle cannot make
        // the registry walk forever.
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}
