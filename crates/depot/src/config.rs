//! Service configuration.
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Bundled defaults (`depot.toml` shipped with the crate)
//! 2. `~/.config/depot/depot.toml`
//! 3. `./depot.toml`
//! 4. `DEPOT_<SECTION>__<KEY>` environment variables
//!
//! ```toml
//! [storage]
//! upload_root = "/var/depot/uploads"
//! index_path = "/var/depot/metadata/index.json"
//! cache_root = "/var/depot/cache"
//! base_url = "https://cdn.example.com/uploads"
//!
//! [policy.videos]
//! max_bytes = 1_073_741_824
//! allowed_types = ["video/mp4"]
//! ```

use config::{Config, Environment, File, FileFormat};
use depot_core::{Category, THUMBNAIL_PRESET, TransformDescriptor, preset};
use depot_error::{ConfigError, DepotError, DepotResult};
use depot_validation::PolicyTable;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Where Depot keeps its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StorageConfig {
    /// Root of the uploaded objects, one subdirectory per category
    upload_root: PathBuf,
    /// JSON metadata index
    index_path: PathBuf,
    /// Root of the derived artifact cache
    cache_root: PathBuf,
    /// Prefix of public URLs
    base_url: String,
}

impl StorageConfig {
    /// Lay everything out under one directory.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            upload_root: root.join("uploads"),
            index_path: root.join("metadata").join("index.json"),
            cache_root: root.join("cache"),
            base_url: "/uploads".to_string(),
        }
    }

    /// Replace the public URL prefix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, category: Category, stored_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            category,
            stored_name
        )
    }

    /// On-disk path of a stored object.
    pub fn object_path(&self, category: Category, stored_name: &str) -> PathBuf {
        self.upload_root.join(category.as_str()).join(stored_name)
    }
}

/// Upload-time thumbnail settings.
///
/// These also define the `thumbnail` transform preset: a request for that
/// preset gets the configured size and quality, so it is served from the
/// artifact made at upload. The other presets are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Edge length of the square thumbnail in pixels
    size: u32,
    /// JPEG quality
    quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: 200,
            quality: 80,
        }
    }
}

impl ThumbnailConfig {
    /// Square thumbnails of `size` pixels at JPEG `quality`.
    pub fn new(size: u32, quality: u8) -> Self {
        Self { size, quality }
    }

    /// The thumbnail preset with the configured size and quality applied.
    pub fn descriptor(&self) -> TransformDescriptor {
        let mut descriptor = preset(THUMBNAIL_PRESET).unwrap_or_default();
        descriptor.width = Some(self.size.max(1));
        descriptor.height = Some(self.size.max(1));
        descriptor.quality = Some(self.quality.clamp(1, 100));
        descriptor
    }
}

/// Listing page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size when the caller does not ask for one
    default_limit: usize,
    /// Largest page size a caller may ask for
    max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl QueryConfig {
    /// Effective page size for a requested one.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        let max = self.max_limit.max(1);
        requested.unwrap_or(self.default_limit).clamp(1, max)
    }
}

/// Complete Depot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct DepotConfig {
    /// Paths and URLs
    storage: StorageConfig,
    /// Per-category upload limits
    #[serde(default)]
    policy: PolicyTable,
    /// Upload-time thumbnails
    #[serde(default)]
    thumbnail: ThumbnailConfig,
    /// Listing page sizes
    #[serde(default)]
    query: QueryConfig,
}

impl DepotConfig {
    /// Default settings with all storage under `root`.
    ///
    /// # Examples
    ///
    /// ```
    /// use depot::DepotConfig;
    ///
    /// let config = DepotConfig::rooted_at("/srv/depot");
    /// assert_eq!(config.storage().cache_root().to_str(), Some("/srv/depot/cache"));
    /// assert_eq!(*config.query().max_limit(), 100);
    /// ```
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        Self {
            storage: StorageConfig::rooted_at(root),
            policy: PolicyTable::default(),
            thumbnail: ThumbnailConfig::default(),
            query: QueryConfig::default(),
        }
    }

    /// Load configuration from one explicit file.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> DepotResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                DepotError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                DepotError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: environment > current dir >
    /// home dir > bundled defaults.
    ///
    /// Missing user files are skipped.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use depot::DepotConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = DepotConfig::load()?;
    /// println!("uploads under {}", config.storage().upload_root().display());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> DepotResult<Self> {
        debug!(
            "Loading configuration with precedence: env > current dir > home dir > bundled defaults"
        );

        const DEFAULT_CONFIG: &str = include_str!("../../../depot.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("depot").join("depot.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("depot").required(false))
            .add_source(
                Environment::with_prefix("DEPOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder
            .build()
            .map_err(|e| {
                DepotError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                DepotError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let config: DepotConfig = Config::builder()
            .add_source(File::from_str(
                include_str!("../../../depot.toml"),
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.policy(), &PolicyTable::default());
        assert_eq!(config.storage().base_url(), "/uploads");
        assert_eq!(*config.thumbnail(), ThumbnailConfig::default());
    }

    #[test]
    fn test_thumbnail_descriptor_matches_preset_by_default() {
        assert_eq!(
            ThumbnailConfig::default().descriptor(),
            preset(THUMBNAIL_PRESET).unwrap()
        );
    }

    #[test]
    fn test_thumbnail_descriptor_follows_size() {
        let descriptor = ThumbnailConfig::new(64, 70).descriptor();
        assert_eq!(descriptor.width, Some(64));
        assert_eq!(descriptor.height, Some(64));
        assert_eq!(descriptor.quality, Some(70));
        assert_eq!(descriptor.fit, preset(THUMBNAIL_PRESET).unwrap().fit);
    }

    #[test]
    fn test_clamp_limit() {
        let query = QueryConfig::default();
        assert_eq!(query.clamp_limit(None), 20);
        assert_eq!(query.clamp_limit(Some(0)), 1);
        assert_eq!(query.clamp_limit(Some(5000)), 100);
    }

    #[test]
    fn test_public_url() {
        let storage = StorageConfig::rooted_at("/tmp/x").with_base_url("https://cdn.test/u/");
        assert_eq!(
            storage.public_url(Category::Images, "photo-1.png"),
            "https://cdn.test/u/images/photo-1.png"
        );
    }
}
