//! Error types for manifest discovery.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors that can occur while resolving the launcher manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest directory could not be listed.
    #[error("failed to list manifest directory '{path}': {source}")]
    ListDirectory {
        path: String,
        source: std::io::Error,
    },

    /// A single manifest entry could not be read.
    #[error("failed to read manifest '{path}': {source}")]
    ReadEntry {
        path: String,
        source: std::io::Error,
    },

    /// A single manifest entry is not a valid launcher record.
    #[error("failed to parse manifest '{path}': {source}")]
    ParseEntry {
        path: String,
        source: serde_json::Error,
    },
}
