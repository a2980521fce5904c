//! Epic Games Launcher manifest discovery.
//!
//! Locates the launcher's `.item` manifest for an installed product, extracts
//! its version and derives the client user-agent the game itself sends
//! (`Fortnite/<AppVersionString>`).
//!
//! # Components
//!
//! - [`resolver`]: directory scan, first-match selection and the per-resolver cache
//! - [`manifest`]: the launcher record format and the derived [`VersionManifest`]
//! - [`fs`]: filesystem capability used by the resolver
//! - [`platform`]: host platform detection
//!
//! # Example
//!
//! ```no_run
//! use fortkit_manifest::{ManifestConfig, ManifestResolver};
//!
//! # async fn example() {
//! let resolver = ManifestResolver::new(ManifestConfig::default());
//! let user_agent = resolver.resolve_user_agent().await;
//! println!("{user_agent}");
//! # }
//! ```

pub mod error;
pub mod fs;
pub mod manifest;
pub mod platform;
pub mod resolver;

pub use error::{ManifestError, Result};
pub use fs::{LocalFs, ManifestFs, SharedManifestFs};
pub use manifest::VersionManifest;
pub use platform::Platform;
pub use resolver::{
    DEFAULT_EXTENSION, DEFAULT_MANIFEST_DIR, DEFAULT_PRODUCT_NAME, FALLBACK_USER_AGENT,
    ManifestConfig, ManifestResolver,
};
