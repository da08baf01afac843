//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a default so that an absent file yields the
//! stock pipeline layout.

pub mod application;
pub mod document;
pub mod layout;
pub mod logging;
pub mod mesh;
pub mod watcher;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::application::ApplicationConfig;
use self::document::DocumentConfig;
use self::layout::LayoutConfig;
use self::logging::LoggingConfig;
use self::mesh::MeshConfig;
use self::watcher::WatcherConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Environment variable prefix for overrides, e.g. `PDF3D__WATCHER__TIMEOUT_SECONDS`.
pub const ENV_PREFIX: &str = "PDF3D";

/// Root application configuration.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout and well-known file names.
    #[serde(default)]
    #[validate(nested)]
    pub layout: LayoutConfig,
    /// Completion watcher budget and markers.
    #[serde(default)]
    #[validate(nested)]
    pub watcher: WatcherConfig,
    /// CAD application bridge.
    #[serde(default)]
    #[validate(nested)]
    pub application: ApplicationConfig,
    /// Mesh normalization and asset encoding.
    #[serde(default)]
    #[validate(nested)]
    pub mesh: MeshConfig,
    /// Document template and compiler.
    #[serde(default)]
    #[validate(nested)]
    pub document: DocumentConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay and
    /// environment variables prefixed with `PDF3D__`. Missing files are not
    /// an error.
    pub fn load(env: &str) -> AppResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        Self::finish(builder)
    }

    /// Load configuration from an explicit file plus environment overrides.
    pub fn load_file(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::not_found(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> AppResult<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        Ok(app)
    }
}
