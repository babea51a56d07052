//! Read-only catalog of channels and videos.

mod models;
mod static_catalog;

pub use models::{CatalogChannel, CatalogVideo};
pub use static_catalog::{load_catalog, Problem as LoadCatalogProblem, StaticCatalog};

use crate::collections::VideoRef;

pub trait Catalog: Send + Sync {
    fn video(&self, id: &str) -> Option<CatalogVideo>;

    fn channel(&self, id: &str) -> Option<CatalogChannel>;

    fn videos(&self) -> Vec<CatalogVideo>;

    fn channels(&self) -> Vec<CatalogChannel>;

    fn videos_by_channel(&self, channel_id: &str) -> Vec<CatalogVideo> {
        self.videos()
            .into_iter()
            .filter(|video| video.channel_id == channel_id)
            .collect()
    }

    /// Case insensitive match on the title. A blank query matches everything.
    fn search(&self, query: &str) -> Vec<CatalogVideo> {
        let query = query.trim().to_lowercase();
        self.videos()
            .into_iter()
            .filter(|video| video.title.to_lowercase().contains(&query))
            .collect()
    }

    /// Snapshot of video `id` for storing in a collection.
    fn video_ref(&self, id: &str) -> Option<VideoRef> {
        let video = self.video(id)?;
        let channel_name = self
            .channel(&video.channel_id)
            .map(|channel| channel.name)
            .unwrap_or_default();
        Some(video.to_video_ref(&channel_name))
    }
}
