//! Sources that turn a library path into a [`DataNode`] tree

use super::DataNode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Library source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing exists at the path
    #[error("Library file not found: {0}")]
    NotFound(String),

    /// The file could not be read
    #[error("Failed to read library file {path}: {source}")]
    Io {
        /// Requested path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a data tree
    #[error("Failed to parse library file {path}: {message}")]
    Parse {
        /// Requested path
        path: String,
        /// Parser message
        message: String,
    },
}

/// Parsing collaborator used by the prefab manager
pub trait LibrarySource {
    /// Load and parse the library stored at `path`
    fn load(&mut self, path: &str) -> Result<DataNode, SourceError>;
}

/// Reads RON encoded [`DataNode`] trees from disk
#[derive(Debug, Clone)]
pub struct RonLibrarySource {
    root: PathBuf,
}

impl RonLibrarySource {
    /// Resolve library paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory paths are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse RON text into a tree
    pub fn parse_str(path: &str, text: &str) -> Result<DataNode, SourceError> {
        ron::from_str(text).map_err(|e| SourceError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

impl LibrarySource for RonLibrarySource {
    fn load(&mut self, path: &str) -> Result<DataNode, SourceError> {
        let full_path = self.root.join(path);
        let text = std::fs::read_to_string(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(full_path.display().to_string())
            } else {
                SourceError::Io {
                    path: full_path.display().to_string(),
                    source: e,
                }
            }
        })?;
        Self::parse_str(path, &text)
    }
}

/// Library trees kept in memory, with a load counter
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrarySource {
    files: HashMap<String, DataNode>,
    loads: HashMap<String, usize>,
}

impl MemoryLibrarySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a file
    pub fn with_file(mut self, path: impl Into<String>, root: DataNode) -> Self {
        self.insert(path, root);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<String>, root: DataNode) {
        self.files.insert(path.into(), root);
    }

    /// Number of successful and failed loads of `path`
    pub fn load_count(&self, path: &str) -> usize {
        self.loads.get(path).copied().unwrap_or(0)
    }

    /// Loads across all paths
    pub fn total_loads(&self) -> usize {
        self.loads.values().sum()
    }
}

impl LibrarySource for MemoryLibrarySource {
    fn load(&mut self, path: &str) -> Result<DataNode, SourceError> {
        *self.loads.entry(path.to_string()).or_insert(0) += 1;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_counts_loads() {
        let mut source = MemoryLibrarySource::new()
            .with_file("a.ron", DataNode::new("PrefabsLibrary"));

        assert!(source.load("a.ron").is_ok());
        assert!(matches!(source.load("b.ron"), Err(SourceError::NotFound(_))));
        assert_eq!(source.load_count("a.ron"), 1);
        assert_eq!(source.load_count("b.ron"), 1);
        assert_eq!(source.total_loads(), 2);
    }

    #[test]
    fn test_ron_source_missing_file() {
        let mut source = RonLibrarySource::new(std::env::temp_dir());
        let result = source.load("definitely_not_a_prefab_library.ron");
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = RonLibrarySource::parse_str("broken.ron", "(tag: ").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
