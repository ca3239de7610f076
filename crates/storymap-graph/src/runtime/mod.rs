//! Platform runtime abstraction for Storymap
//!
//! This module defines the `Runtime` trait that abstracts the file I/O done at
//! the edges of a build: crawling the project, reading sources and writing the
//! output snapshot. Graph construction itself never touches the filesystem.

#[cfg(not(target_family = "wasm"))]
pub mod native;

// Test utilities (available in test builds)
#[cfg(any(
    all(test, not(target_family = "wasm")),
    all(feature = "test-utils", not(target_family = "wasm"))
))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
    /// Whether the path itself is a symbolic link. `is_dir`/`is_file`
    /// describe the link target.
    pub is_symlink: bool,
    /// Last modified timestamp (milliseconds since epoch)
    pub modified: Option<u64>,
}

/// Platform runtime trait
///
/// Implementations provide the file operations needed to load a project into
/// memory and persist the build output.
///
/// # Example
///
/// ```rust,ignore
/// use storymap_graph::runtime::{Runtime, RuntimeResult};
/// use async_trait::async_trait;
///
/// struct MyRuntime;
///
/// #[async_trait]
/// impl Runtime for MyRuntime {
///     async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
///         std::fs::read(path).map_err(|e| RuntimeError::Io(e.to_string()))
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write a file to the filesystem
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory
    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()>;

    /// Read the entry names of a directory
    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<String>>;

    /// Get the current working directory
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
