//! Per-user privacy settings.
//!
//! Settings are persisted as a JSON object mapping each key to the string
//! form of its value, under `privacy_settings_<handle>`. Keys that were never
//! written read as their default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::collections::{ChangeNotifier, Committed, Subscription};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

pub const SETTINGS_KEY_PREFIX: &str = "privacy_settings";

const HISTORY_PAUSED: &str = "history_paused";
const SUBSCRIPTIONS_PRIVATE: &str = "subscriptions_private";
const LIKED_VIDEOS_PRIVATE: &str = "liked_videos_private";

/// All supported privacy settings with their typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum PrivacySetting {
    /// While set, watching a video leaves the history untouched.
    #[serde(rename = "history_paused")]
    HistoryPaused(bool),

    /// Recorded for views that show a user's subscriptions to others. This
    /// client only shows lists to their owner, so nothing here filters on it.
    #[serde(rename = "subscriptions_private")]
    SubscriptionsPrivate(bool),

    /// Same as `SubscriptionsPrivate`, for the liked videos list.
    #[serde(rename = "liked_videos_private")]
    LikedVideosPrivate(bool),
}

impl PrivacySetting {
    pub const KEYS: [&'static str; 3] =
        [HISTORY_PAUSED, SUBSCRIPTIONS_PRIVATE, LIKED_VIDEOS_PRIVATE];

    pub fn key(&self) -> &'static str {
        match self {
            Self::HistoryPaused(_) => HISTORY_PAUSED,
            Self::SubscriptionsPrivate(_) => SUBSCRIPTIONS_PRIVATE,
            Self::LikedVideosPrivate(_) => LIKED_VIDEOS_PRIVATE,
        }
    }

    pub fn value_to_string(&self) -> String {
        match self {
            Self::HistoryPaused(enabled)
            | Self::SubscriptionsPrivate(enabled)
            | Self::LikedVideosPrivate(enabled) => enabled.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Self::HistoryPaused(enabled)
            | Self::SubscriptionsPrivate(enabled)
            | Self::LikedVideosPrivate(enabled) => *enabled,
        }
    }

    /// Parses a stored key/value pair.
    ///
    /// Returns `Err` with a description if the key is unknown or the value is
    /// not a boolean.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        let parse = || {
            value
                .parse::<bool>()
                .map_err(|_| format!("Invalid boolean value for {}: {}", key, value))
        };
        match key {
            HISTORY_PAUSED => Ok(Self::HistoryPaused(parse()?)),
            SUBSCRIPTIONS_PRIVATE => Ok(Self::SubscriptionsPrivate(parse()?)),
            LIKED_VIDEOS_PRIVATE => Ok(Self::LikedVideosPrivate(parse()?)),
            _ => Err(format!("Unknown setting key: {}", key)),
        }
    }

    pub fn is_known_key(key: &str) -> bool {
        Self::KEYS.contains(&key)
    }

    pub fn default_for_key(key: &str) -> Option<Self> {
        match key {
            HISTORY_PAUSED => Some(Self::HistoryPaused(false)),
            SUBSCRIPTIONS_PRIVATE => Some(Self::SubscriptionsPrivate(false)),
            LIKED_VIDEOS_PRIVATE => Some(Self::LikedVideosPrivate(false)),
            _ => None,
        }
    }
}

pub struct SettingsStore {
    key: StorageKey,
    persistence: PersistenceAdapter,
    notifier: ChangeNotifier,
    values: Mutex<BTreeMap<String, String>>,
}

impl SettingsStore {
    pub fn open(
        handle: Option<&str>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let key = StorageKey::scoped(SETTINGS_KEY_PREFIX, handle);
        let mut values: BTreeMap<String, String> = persistence.load(&key).unwrap_or_default();
        values.retain(|k, v| match PrivacySetting::from_key_value(k, v) {
            Ok(_) => true,
            Err(err) => {
                warn!("Dropping persisted setting under '{}': {}", key, err);
                false
            }
        });
        debug!("Opened settings under '{}' with {} values", key, values.len());
        SettingsStore {
            key,
            persistence,
            notifier,
            values: Mutex::new(values),
        }
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current value of `key`, or its default if it was never set.
    /// Returns None for unknown keys.
    pub fn get(&self, key: &str) -> Option<PrivacySetting> {
        let stored = self
            .values()
            .get(key)
            .and_then(|value| PrivacySetting::from_key_value(key, value).ok());
        stored.or_else(|| PrivacySetting::default_for_key(key))
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|setting| setting.is_enabled())
    }

    pub fn history_paused(&self) -> bool {
        self.is_enabled(HISTORY_PAUSED)
    }

    /// Every known setting, stored or default.
    pub fn all(&self) -> Vec<PrivacySetting> {
        PrivacySetting::KEYS
            .iter()
            .filter_map(|key| self.get(key))
            .collect()
    }

    pub fn set(&self, setting: PrivacySetting) -> Committed<()> {
        let save_result = {
            let mut values = self.values();
            values.insert(setting.key().to_string(), setting.value_to_string());
            self.persistence.save(&self.key, &*values)
        };
        if let Err(err) = &save_result {
            warn!("Failed to persist settings under '{}': {}", self.key, err);
        }

        self.notifier.publish(&ChangeEvent::SettingChanged { setting });
        Committed::new((), save_result)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(move |event| {
            if matches!(event, ChangeEvent::SettingChanged { .. }) {
                callback(event);
            }
        })
    }
}
