mod file_config;

pub use file_config::{FileConfig, LimitsConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

/// Largest image accepted in a post when nothing is configured.
pub const DEFAULT_MAX_POST_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub storage_path: Option<PathBuf>,
    pub storage_quota_bytes: Option<usize>,
    pub catalog_path: Option<PathBuf>,
    pub max_history_entries: Option<usize>,
    pub max_posts: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// SQLite file backing the storage; in-memory storage when None.
    pub storage_path: Option<PathBuf>,
    /// Only applies to in-memory storage.
    pub storage_quota_bytes: Option<usize>,
    /// Catalog JSON file; the bundled demo catalog when None.
    pub catalog_path: Option<PathBuf>,

    pub limits: LimitSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitSettings {
    /// Unbounded when None.
    pub max_history_entries: Option<usize>,
    /// Unbounded when None.
    pub max_posts: Option<usize>,
    pub max_post_image_bytes: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_history_entries: None,
            max_posts: None,
            max_post_image_bytes: DEFAULT_MAX_POST_IMAGE_BYTES,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let storage_path = file
            .storage_path
            .map(PathBuf::from)
            .or_else(|| cli.storage_path.clone());
        if let Some(path) = &storage_path {
            if path.is_dir() {
                bail!("storage_path is a directory: {:?}", path);
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    bail!("Storage directory does not exist: {:?}", parent);
                }
            }
        }

        let storage_quota_bytes = file.storage_quota_bytes.or(cli.storage_quota_bytes);

        let catalog_path = file
            .catalog_path
            .map(PathBuf::from)
            .or_else(|| cli.catalog_path.clone());
        if let Some(path) = &catalog_path {
            if !path.is_file() {
                bail!("Catalog file not found: {:?}", path);
            }
        }

        // Limits - merge file config with CLI and defaults
        let limits_file = file.limits.unwrap_or_default();
        let limits = LimitSettings {
            max_history_entries: limits_file
                .max_history_entries
                .or(cli.max_history_entries),
            max_posts: limits_file.max_posts.or(cli.max_posts),
            max_post_image_bytes: limits_file
                .max_post_image_bytes
                .unwrap_or(DEFAULT_MAX_POST_IMAGE_BYTES),
        };
        if limits.max_history_entries == Some(0) || limits.max_posts == Some(0) {
            bail!("Collection limits must be greater than zero");
        }

        Ok(Self {
            storage_path,
            storage_quota_bytes,
            catalog_path,
            limits,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();

        assert!(config.is_in_memory());
        assert_eq!(config.storage_quota_bytes, None);
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.limits, LimitSettings::default());
        assert_eq!(config.limits.max_history_entries, None);
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = temp_dir.path().join("catalog.json");
        std::fs::write(&catalog, "{}").unwrap();

        let cli = CliConfig {
            storage_path: Some(temp_dir.path().join("storage.db")),
            storage_quota_bytes: Some(1024),
            catalog_path: Some(catalog.clone()),
            max_history_entries: Some(10),
            max_posts: Some(5),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.storage_path, Some(temp_dir.path().join("storage.db")));
        assert_eq!(config.storage_quota_bytes, Some(1024));
        assert_eq!(config.catalog_path, Some(catalog));
        assert_eq!(config.limits.max_history_entries, Some(10));
        assert_eq!(config.limits.max_posts, Some(5));
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            storage_path: Some(PathBuf::from("/should/be/overridden.db")),
            max_history_entries: Some(10),
            max_posts: Some(5),
            ..Default::default()
        };
        let file_config = FileConfig {
            storage_path: Some(
                temp_dir
                    .path()
                    .join("toml.db")
                    .to_string_lossy()
                    .to_string(),
            ),
            limits: Some(LimitsConfig {
                max_history_entries: Some(100),
                max_post_image_bytes: Some(512),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.storage_path, Some(temp_dir.path().join("toml.db")));
        assert_eq!(config.limits.max_history_entries, Some(100));
        assert_eq!(config.limits.max_post_image_bytes, 512);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.limits.max_posts, Some(5));
    }

    #[test]
    fn test_resolve_missing_storage_dir_error() {
        let cli = CliConfig {
            storage_path: Some(PathBuf::from("/nonexistent/dir/storage.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_storage_path_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            storage_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }

    #[test]
    fn test_resolve_missing_catalog_error() {
        let cli = CliConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.json")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Catalog file not found"));
    }

    #[test]
    fn test_resolve_zero_limit_error() {
        let cli = CliConfig {
            max_posts: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }
}
