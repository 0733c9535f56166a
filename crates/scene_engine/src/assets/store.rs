//! Backing stores the registry reads source files from

use super::{normalize_path, AssetError};
use crate::core::config::AssetConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Read-only byte source for asset files
pub trait AssetStore: Send + Sync {
    /// Read the whole file at a normalized asset path
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Whether the path can be read
    fn exists(&self, path: &str) -> bool;
}

/// Store resolving asset paths against a list of directories
///
/// Roots are tried in order; the first existing candidate wins. Absolute
/// paths are used as-is.
#[derive(Debug, Clone)]
pub struct FileStore {
    roots: Vec<PathBuf>,
}

impl FileStore {
    /// Create a store over the given roots
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a store from asset configuration
    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(config.roots())
    }

    /// Search roots in lookup order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Locate a file on disk
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }
        self.roots
            .iter()
            .map(|root| root.join(requested))
            .find(|candidate| candidate.is_file())
    }
}

impl AssetStore for FileStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full_path = self
            .resolve(path)
            .ok_or_else(|| AssetError::NotFound(path.to_string()))?;
        log::trace!("Reading {} from {}", path, full_path.display());
        Ok(std::fs::read(full_path)?)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }
}

/// In-memory store, used by tests and tools that synthesize assets
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_path(path), contents.into());
    }

    /// Remove a file
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize_path(path))
    }
}

impl AssetStore for MemoryStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize_path(path))
    }
}
