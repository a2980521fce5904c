//! Configuration for fortkit.
//!
//! TOML files are layered: the user config (`FORTKIT_CONFIG_DIR` or the
//! platform config dir) first, then a project-local `fortkit.toml`. Later
//! layers override earlier ones field by field.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::{FortkitConfig, HttpSection, ManifestSection};
