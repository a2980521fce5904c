//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [http]
//! protected_domain = "epicgames.com"
//! timeout_secs = 30
//!
//! [http.headers]
//! "Accept-Language" = "en"
//!
//! [manifest]
//! directory = "C:/ProgramData/Epic/EpicGamesLauncher/Data/Manifests"
//! product_name = "Fortnite"
//! extension = "item"
//! fallback_user_agent = "Fortnite/++Fortnite+Release-38.10-CL-47888945-Windows"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Every field is optional so partial project-local files can be layered on
/// top of the user config. Unset values fall back to the library defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortkitConfig {
    pub http: Option<HttpSection>,
    pub manifest: Option<ManifestSection>,
}

impl FortkitConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: FortkitConfig) {
        if let Some(layer) = other.http {
            match &mut self.http {
                Some(base) => base.merge(layer),
                None => self.http = Some(layer),
            }
        }

        if let Some(layer) = other.manifest {
            match &mut self.manifest {
                Some(base) => base.merge(layer),
                None => self.manifest = Some(layer),
            }
        }
    }
}

/// `[http]`: request pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Hosts under this domain get credential refresh and error normalization.
    pub protected_domain: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: Option<u64>,
    /// Headers sent with every request unless the request sets them.
    pub headers: BTreeMap<String, String>,
}

impl HttpSection {
    fn merge(&mut self, other: HttpSection) {
        if other.protected_domain.is_some() {
            self.protected_domain = other.protected_domain;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        self.headers.extend(other.headers);
    }
}

/// `[manifest]`: launcher manifest lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestSection {
    pub directory: Option<PathBuf>,
    pub product_name: Option<String>,
    /// File extension without the leading dot.
    pub extension: Option<String>,
    pub fallback_user_agent: Option<String>,
}

impl ManifestSection {
    fn merge(&mut self, other: ManifestSection) {
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.product_name.is_some() {
            self.product_name = other.product_name;
        }
        if other.extension.is_some() {
            self.extension = other.extension;
        }
        if other.fallback_user_agent.is_some() {
            self.fallback_user_agent = other.fallback_user_agent;
        }
    }
}
