//! Local path index: ImageID → file in the local mirror
//!
//! The mirror is split across arbitrarily nested folders, so the whole tree is
//! walked once and every image is keyed by its file stem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{MapperError, Result};

/// Mapping from canonical image identifier to the file holding it
#[derive(Debug, Default, Clone)]
pub struct LocalPathIndex {
    id_to_path: HashMap<String, PathBuf>,
}

impl LocalPathIndex {
    /// Walk `root` recursively and index every `*.<extension>` file.
    ///
    /// Entries are visited sorted by file name, so when two files in different
    /// folders share a stem, the one visited last (the later folder) wins.
    /// Any entry that cannot be read aborts the scan.
    pub fn scan(root: &Path, extension: &str) -> Result<Self> {
        if !root.is_dir() {
            return Err(MapperError::ImageRootMissing(root.to_path_buf()));
        }
        let root = std::path::absolute(root).map_err(|e| MapperError::io(root, e))?;

        let suffix = format!(".{}", extension.trim_start_matches('.').to_lowercase());
        let mut index = Self::default();
        let mut visited = 0usize;

        // Walk the directory tree recursively
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            visited += 1;

            // Only index files; a symlink counts unless it points at a directory
            let file_type = entry.file_type();
            let is_file = file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir());
            if !is_file {
                continue;
            }

            let Some(image_id) = image_id_for(entry.path(), &suffix) else {
                continue;
            };
            if let Some(previous) = index.insert(image_id, entry.into_path()) {
                tracing::debug!("♻️  Duplicate image ID, replacing {}", previous.display());
            }
        }

        tracing::debug!("🔍 Visited {} entries under {}", visited, root.display());
        Ok(index)
    }

    /// Indexed path for `image_id`, if any
    pub fn get(&self, image_id: &str) -> Option<&Path> {
        self.id_to_path.get(image_id).map(PathBuf::as_path)
    }

    /// Insert or overwrite; returns the path that was replaced
    pub fn insert(&mut self, image_id: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.id_to_path.insert(image_id.into(), path.into())
    }

    pub fn len(&self) -> usize {
        self.id_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_path.is_empty()
    }
}

/// File stem of `path` when its name ends in `suffix` (case-insensitive)
fn image_id_for(path: &Path, suffix: &str) -> Option<String> {
    let filename = path.file_name()?.to_string_lossy();
    if !filename.to_lowercase().ends_with(suffix) {
        return None;
    }
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}
