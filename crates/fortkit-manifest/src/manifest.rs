//! Launcher manifest record format and the derived version manifest.

use serde::{Deserialize, Serialize};

/// Raw `.item` record written by the Epic Games Launcher.
///
/// Only the fields the resolver uses are declared; `CatalogItemId` and the
/// rest of the launcher's bookkeeping are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ManifestRecord {
    pub display_name: String,
    #[serde(default)]
    pub app_version_string: Option<String>,
    #[serde(default)]
    pub catalog_namespace: Option<String>,
    #[serde(default)]
    pub launch_command: Option<String>,
    #[serde(default)]
    pub install_location: Option<String>,
    #[serde(default)]
    pub launch_executable: Option<String>,
}

impl ManifestRecord {
    /// Parse a record from file contents, tolerating a UTF-8 byte order mark.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content.trim_start_matches('\u{feff}'))
    }

    /// Whether this record describes `product_name` (case-insensitive).
    pub fn is_product(&self, product_name: &str) -> bool {
        self.display_name.to_lowercase() == product_name.to_lowercase()
    }
}

/// Version information for an installed product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionManifest {
    /// Trimmed `AppVersionString`, empty when the launcher recorded none.
    pub app_version_string: String,
    pub namespace: String,
    pub launch_command: String,
    /// `<product>/<app_version_string>`, or empty when there is no version.
    pub user_agent: String,
    pub install_location: String,
    pub launch_executable: String,
    pub executable_location: String,
}

impl VersionManifest {
    pub(crate) fn from_record(record: ManifestRecord, product_name: &str) -> Self {
        let app_version_string = record
            .app_version_string
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let user_agent = if app_version_string.is_empty() {
            String::new()
        } else {
            format!("{}/{}", product_name, app_version_string)
        };

        let launch_executable = record.launch_executable.unwrap_or_default();

        Self {
            namespace: record.catalog_namespace.unwrap_or_default(),
            launch_command: record
                .launch_command
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            user_agent,
            install_location: record.install_location.unwrap_or_default(),
            executable_location: launch_executable.clone(),
            launch_executable,
            app_version_string,
        }
    }

    /// Whether a user-agent could be derived from this manifest.
    pub fn has_user_agent(&self) -> bool {
        !self.user_agent.is_empty()
    }
}
