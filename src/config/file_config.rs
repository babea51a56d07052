use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub storage_path: Option<String>,
    pub storage_quota_bytes: Option<usize>,
    pub catalog_path: Option<String>,

    // Feature configs
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_history_entries: Option<usize>,
    pub max_posts: Option<usize>,
    pub max_post_image_bytes: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
