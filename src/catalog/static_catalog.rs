use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::{Catalog, CatalogChannel, CatalogVideo};

const DEMO_CATALOG: &str = include_str!("../../data/demo_catalog.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    EmptyId,
    DuplicateChannel(String),
    DuplicateVideo(String),
    UnknownChannel { video_id: String, channel_id: String },
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    channels: Vec<CatalogChannel>,
    #[serde(default)]
    videos: Vec<CatalogVideo>,
}

/// Catalog held entirely in memory, in the order it was loaded.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    channels: Vec<CatalogChannel>,
    videos: Vec<CatalogVideo>,
    channels_by_id: HashMap<String, usize>,
    videos_by_id: HashMap<String, usize>,
}

impl StaticCatalog {
    /// Builds the catalog, skipping entries that would make it inconsistent.
    pub fn build(
        channels: Vec<CatalogChannel>,
        videos: Vec<CatalogVideo>,
    ) -> (StaticCatalog, Vec<Problem>) {
        let mut catalog = StaticCatalog::default();
        let mut problems = Vec::new();

        for channel in channels {
            if channel.id.trim().is_empty() {
                problems.push(Problem::EmptyId);
            } else if catalog.channels_by_id.contains_key(&channel.id) {
                problems.push(Problem::DuplicateChannel(channel.id));
            } else {
                catalog
                    .channels_by_id
                    .insert(channel.id.clone(), catalog.channels.len());
                catalog.channels.push(channel);
            }
        }

        for video in videos {
            if video.id.trim().is_empty() {
                problems.push(Problem::EmptyId);
            } else if catalog.videos_by_id.contains_key(&video.id) {
                problems.push(Problem::DuplicateVideo(video.id));
            } else if !catalog.channels_by_id.contains_key(&video.channel_id) {
                problems.push(Problem::UnknownChannel {
                    video_id: video.id,
                    channel_id: video.channel_id,
                });
            } else {
                catalog
                    .videos_by_id
                    .insert(video.id.clone(), catalog.videos.len());
                catalog.videos.push(video);
            }
        }

        (catalog, problems)
    }

    pub fn from_json_str(json: &str) -> Result<(StaticCatalog, Vec<Problem>)> {
        let file: CatalogFile = serde_json::from_str(json).context("Malformed catalog")?;
        Ok(Self::build(file.channels, file.videos))
    }

    pub fn videos_count(&self) -> usize {
        self.videos.len()
    }

    pub fn channels_count(&self) -> usize {
        self.channels.len()
    }
}

/// Loads the catalog at `path`, or the bundled demo catalog when None.
/// Problems are logged and the offending entries left out.
pub fn load_catalog(path: Option<&Path>) -> Result<StaticCatalog> {
    let (catalog, problems) = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
            StaticCatalog::from_json_str(&json)
                .with_context(|| format!("Failed to parse catalog file: {:?}", path))?
        }
        None => StaticCatalog::from_json_str(DEMO_CATALOG)?,
    };

    if !problems.is_empty() {
        info!("Found {} problems:", problems.len());
        for problem in problems.iter() {
            info!("- {:?}", problem);
        }
    }
    info!(
        "Catalog has {} channels and {} videos",
        catalog.channels_count(),
        catalog.videos_count()
    );
    Ok(catalog)
}

impl Catalog for StaticCatalog {
    fn video(&self, id: &str) -> Option<CatalogVideo> {
        self.videos_by_id
            .get(id)
            .map(|index| self.videos[*index].clone())
    }

    fn channel(&self, id: &str) -> Option<CatalogChannel> {
        self.channels_by_id
            .get(id)
            .map(|index| self.channels[*index].clone())
    }

    fn videos(&self) -> Vec<CatalogVideo> {
        self.videos.clone()
    }

    fn channels(&self) -> Vec<CatalogChannel> {
        self.channels.clone()
    }
}
