//! Memoized hashing of files and directories.
//!
//! Many targets share files (a header folder, a resource catalog), so every
//! path is read at most once per [`FileHasher`]. The memo is a concurrent map
//! because targets of one dependency level are hashed in parallel.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use kiln_common::{ContentHash, HashBuilder};

use crate::error::HashError;

/// Content hashes of files and directories, memoized by absolute path.
#[derive(Debug, Default)]
pub struct FileHasher {
    memo: DashMap<PathBuf, ContentHash>,
}

impl FileHasher {
    /// Creates a hasher with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes the file or directory at `path`.
    ///
    /// A file hashes to its content. A directory hashes to the sorted list of
    /// the files below it, each contributing its path relative to the
    /// directory and its content. Empty subdirectories do not contribute.
    pub fn hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        if let Some(hash) = self.memo.get(path) {
            return Ok(*hash);
        }
        let metadata = std::fs::metadata(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let hash = if metadata.is_dir() {
            self.hash_directory(path)?
        } else {
            tracing::trace!("hashing {}", path.display());
            let content = std::fs::read(path).map_err(|source| HashError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            ContentHash::from_bytes(&content)
        };
        self.memo.insert(path.to_path_buf(), hash);
        Ok(hash)
    }

    /// Returns the number of memoized paths.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Returns `true` if nothing has been hashed yet.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    fn hash_directory(&self, dir: &Path) -> Result<ContentHash, HashError> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let mut builder = HashBuilder::new();
        for file in &files {
            builder
                .update_str(&portable(&kiln_common::relative_path(file, dir)))
                .update_hash(&self.hash(file)?);
        }
        Ok(builder.finish())
    }
}

/// Renders a relative path with `/` separators regardless of platform.
pub(crate) fn portable(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), HashError> {
    let entries = std::fs::read_dir(dir).map_err(|source| HashError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| HashError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
