//! Change events published by the stores.
//!
//! Events are serialized using serde's adjacently tagged representation:
//! `{"type": "event_name", "payload": {...}}`

use serde::{Deserialize, Serialize};

use crate::collections::CollectionKind;
use crate::settings::PrivacySetting;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ChangeEvent {
    // Collections
    #[serde(rename = "item_added")]
    ItemAdded { collection: CollectionKind, id: String },

    #[serde(rename = "item_removed")]
    ItemRemoved { collection: CollectionKind, id: String },

    #[serde(rename = "collection_cleared")]
    CollectionCleared { collection: CollectionKind },

    // Settings
    #[serde(rename = "setting_changed")]
    SettingChanged { setting: PrivacySetting },

    // Session
    #[serde(rename = "logged_in")]
    LoggedIn { handle: String },

    #[serde(rename = "logged_out")]
    LoggedOut { handle: String },
}

impl ChangeEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::ItemAdded { .. } => "item_added",
            ChangeEvent::ItemRemoved { .. } => "item_removed",
            ChangeEvent::CollectionCleared { .. } => "collection_cleared",
            ChangeEvent::SettingChanged { .. } => "setting_changed",
            ChangeEvent::LoggedIn { .. } => "logged_in",
            ChangeEvent::LoggedOut { .. } => "logged_out",
        }
    }

    /// The collection this event is about, if any.
    pub fn collection(&self) -> Option<CollectionKind> {
        match self {
            ChangeEvent::ItemAdded { collection, .. }
            | ChangeEvent::ItemRemoved { collection, .. }
            | ChangeEvent::CollectionCleared { collection } => Some(*collection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_added_serialization() {
        let event = ChangeEvent::ItemAdded {
            collection: CollectionKind::LikedVideos,
            id: "v1".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"item_added","payload":{"collection":"liked_videos","id":"v1"}}"#
        );

        let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_setting_changed_serialization() {
        let event = ChangeEvent::SettingChanged {
            setting: PrivacySetting::HistoryPaused(true),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("setting_changed"));
        assert!(json.contains("history_paused"));

        let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[test]
    fn test_event_type_matches_serialized_tag() {
        let events = vec![
            ChangeEvent::CollectionCleared {
                collection: CollectionKind::History,
            },
            ChangeEvent::LoggedIn {
                handle: "bob".to_string(),
            },
            ChangeEvent::LoggedOut {
                handle: "bob".to_string(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }

    #[test]
    fn test_collection_accessor() {
        let event = ChangeEvent::ItemRemoved {
            collection: CollectionKind::Posts,
            id: "p".to_string(),
        };
        assert_eq!(event.collection(), Some(CollectionKind::Posts));
        assert_eq!(
            ChangeEvent::LoggedIn {
                handle: "a".to_string()
            }
            .collection(),
            None
        );
    }
}
