//! Filesystem capability used by the resolver.
//!
//! The resolver only needs to list a directory, read a text file and join a
//! path. Keeping that behind a trait lets tests count or fake the I/O.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

/// Minimal directory/file access for manifest discovery.
#[async_trait]
pub trait ManifestFs: Send + Sync + std::fmt::Debug {
    /// List the names of the entries in `dir`.
    async fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Read a whole file as UTF-8 text.
    async fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Join a directory and an entry name.
    fn join(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(name)
    }
}

/// Shared filesystem handle.
pub type SharedManifestFs = Arc<dyn ManifestFs>;

/// Local filesystem backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

#[async_trait]
impl ManifestFs for LocalFs {
    async fn list_entries(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // Non UTF-8 names can never match the manifest extension
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    async fn read_text(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
