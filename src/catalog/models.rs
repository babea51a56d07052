use serde::{Deserialize, Serialize};

use crate::collections::VideoRef;

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct CatalogChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq, Eq)]
pub struct CatalogVideo {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration_secs: u32,
    #[serde(default)]
    pub views: u64,
}

impl CatalogVideo {
    /// The snapshot stored in collections, taken with the channel's current
    /// name.
    pub fn to_video_ref(&self, channel_name: &str) -> VideoRef {
        VideoRef {
            id: self.id.clone(),
            title: self.title.clone(),
            channel_name: channel_name.to_string(),
            thumbnail: self.thumbnail.clone(),
        }
    }

    /// `m:ss`, or `h:mm:ss` for videos of an hour or more.
    pub fn duration_label(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}
