//! Everything one browser session owns: the session store and the
//! collections of whoever is logged in.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::collections::{
    AuthoredPost, ChangeNotifier, CollectionError, Committed, HistoryStore, InlineImage,
    LikedVideos, PostDraft, PostStore, Subscription, Subscriptions, VideoRef, WatchLater,
};
use crate::config::{AppConfig, LimitSettings};
use crate::events::ChangeEvent;
use crate::session::{Guarded, Identity, SessionError, SessionStore};
use crate::settings::{PrivacySetting, SettingsStore};
use crate::storage::{KeyValueStorage, MemoryStorage, PersistenceAdapter, SqliteStorage};

/// Opens the storage backend selected by `config`.
pub fn open_storage(config: &AppConfig) -> Result<Arc<dyn KeyValueStorage>> {
    match &config.storage_path {
        Some(path) => {
            let storage = SqliteStorage::new(path)
                .with_context(|| format!("Failed to open storage at {:?}", path))?;
            Ok(Arc::new(storage))
        }
        None => Ok(match config.storage_quota_bytes {
            Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
            None => Arc::new(MemoryStorage::new()),
        }),
    }
}

/// The stores of one namespace.
pub struct UserCollections {
    pub history: HistoryStore,
    pub liked: LikedVideos,
    pub watch_later: WatchLater,
    pub subscriptions: Subscriptions,
    pub posts: PostStore,
    pub settings: SettingsStore,
}

impl UserCollections {
    pub fn open(
        handle: Option<&str>,
        limits: &LimitSettings,
        persistence: &PersistenceAdapter,
        notifier: &ChangeNotifier,
    ) -> Self {
        UserCollections {
            history: HistoryStore::open(
                handle,
                limits.max_history_entries,
                persistence.clone(),
                notifier.clone(),
            ),
            liked: LikedVideos::open(handle, persistence.clone(), notifier.clone()),
            watch_later: WatchLater::open(handle, persistence.clone(), notifier.clone()),
            subscriptions: Subscriptions::open(handle, persistence.clone(), notifier.clone()),
            posts: PostStore::open(
                handle,
                limits.max_posts,
                persistence.clone(),
                notifier.clone(),
            ),
            settings: SettingsStore::open(handle, persistence.clone(), notifier.clone()),
        }
    }
}

#[derive(Debug)]
pub enum WatchOutcome {
    Recorded(Committed<()>),
    /// History is paused; nothing was recorded.
    Paused,
}

pub struct Library {
    persistence: PersistenceAdapter,
    notifier: ChangeNotifier,
    limits: LimitSettings,
    session: SessionStore,
    collections: RwLock<Arc<UserCollections>>,
}

impl Library {
    /// Restores the session and opens the collections of its namespace.
    pub fn open(storage: Arc<dyn KeyValueStorage>, config: &AppConfig) -> Self {
        let persistence = PersistenceAdapter::new(storage);
        let notifier = ChangeNotifier::new();
        let session = SessionStore::open(persistence.clone(), notifier.clone());
        let collections = UserCollections::open(
            session.handle().as_deref(),
            &config.limits,
            &persistence,
            &notifier,
        );
        Library {
            persistence,
            notifier,
            limits: config.limits.clone(),
            session,
            collections: RwLock::new(Arc::new(collections)),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn limits(&self) -> &LimitSettings {
        &self.limits
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        self.persistence.storage()
    }

    /// Collections of the current namespace. The handle is only valid until
    /// the next login or logout.
    pub fn collections(&self) -> Arc<UserCollections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every event of every store, across logins.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Logs in and opens the collections of the new handle. Subscribers see
    /// `LoggedIn` only once those collections are in place.
    pub fn login(&self, username: &str) -> Result<Committed<Identity>, SessionError> {
        self.session.login_then(username, |identity| {
            self.reopen_collections(Some(identity.handle.as_str()))
        })
    }

    pub fn logout(&self) -> Result<Committed<Identity>, SessionError> {
        self.session.logout_then(|_| self.reopen_collections(None))
    }

    fn reopen_collections(&self, handle: Option<&str>) {
        let collections =
            UserCollections::open(handle, &self.limits, &self.persistence, &self.notifier);
        *self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(collections);
        debug!("Collections reopened for {}", handle.unwrap_or("anonymous"));
    }

    /// Records a watch unless history is paused.
    pub fn watch(
        &self,
        video: VideoRef,
        at: DateTime<Utc>,
    ) -> Result<WatchOutcome, CollectionError> {
        let collections = self.collections();
        if collections.settings.history_paused() {
            debug!("History paused, not recording {}", video.id);
            return Ok(WatchOutcome::Paused);
        }
        collections
            .history
            .record_watch(video, at)
            .map(WatchOutcome::Recorded)
    }

    /// Encodes an image for a post, applying the configured size limit.
    pub fn attach_image(&self, bytes: &[u8]) -> Result<InlineImage, CollectionError> {
        InlineImage::from_bytes(bytes, self.limits.max_post_image_bytes)
    }

    pub fn publish_post(
        &self,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Guarded<Result<Committed<AuthoredPost>, CollectionError>> {
        self.collections().posts.publish(&self.session, draft, now)
    }

    pub fn delete_post(&self, post_id: &str) -> Guarded<Committed<usize>> {
        self.session
            .require_identity()
            .map(|_| self.collections().posts.delete(post_id))
    }

    pub fn set_setting(&self, setting: PrivacySetting) -> Guarded<Committed<()>> {
        self.session.require_identity().map(|identity| {
            info!("{} changed {}", identity.handle, setting.key());
            self.collections().settings.set(setting)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Visibility;
    use std::sync::Mutex;

    fn video(id: &str) -> VideoRef {
        VideoRef {
            id: id.to_string(),
            title: "A".to_string(),
            channel_name: "C".to_string(),
            thumbnail: String::new(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn library(storage: Arc<dyn KeyValueStorage>) -> Library {
        Library::open(storage, &AppConfig::default())
    }

    #[test]
    fn collections_follow_the_session() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let library = library(storage.clone());

        library.collections().liked.toggle(video("anon")).unwrap();
        library.login("Alice").unwrap();
        assert!(library.collections().liked.is_empty());
        library.collections().liked.toggle(video("v1")).unwrap();

        library.logout().unwrap();
        assert!(library.collections().liked.is_liked("anon"));
        assert!(!library.collections().liked.is_liked("v1"));

        library.login("alice").unwrap();
        assert!(library.collections().liked.is_liked("v1"));
        assert!(storage.get("liked_videos_alice").unwrap().is_some());
        assert!(storage.get("liked_videos_anonymous").unwrap().is_some());
    }

    #[test]
    fn reopening_restores_the_logged_in_namespace() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        {
            let library = library(storage.clone());
            library.login("bob").unwrap();
            library.watch(video("v1"), at(100)).unwrap();
        }

        let reopened = library(storage);
        assert_eq!(reopened.session().handle().as_deref(), Some("bob"));
        assert!(reopened.collections().history.contains("v1"));
    }

    #[test]
    fn paused_history_skips_watches() {
        let library = library(Arc::new(MemoryStorage::new()));
        library.login("alice").unwrap();
        library
            .set_setting(PrivacySetting::HistoryPaused(true))
            .proceeded()
            .unwrap();

        let outcome = library.watch(video("v1"), at(1)).unwrap();
        assert!(matches!(outcome, WatchOutcome::Paused));
        assert!(library.collections().history.is_empty());

        library.set_setting(PrivacySetting::HistoryPaused(false));
        assert!(matches!(
            library.watch(video("v1"), at(2)).unwrap(),
            WatchOutcome::Recorded(_)
        ));
        assert!(library.collections().history.contains("v1"));
    }

    #[test]
    fn guarded_operations_redirect_anonymous_users() {
        let library = library(Arc::new(MemoryStorage::new()));
        let draft = PostDraft {
            message: "hello".to_string(),
            ..Default::default()
        };

        assert!(library.publish_post(draft.clone(), at(1)).is_redirect());
        assert!(library.delete_post("p1").is_redirect());
        assert!(library
            .set_setting(PrivacySetting::LikedVideosPrivate(true))
            .is_redirect());

        library.login("alice").unwrap();
        let post = library
            .publish_post(draft, at(1))
            .proceeded()
            .unwrap()
            .unwrap()
            .into_value();
        assert_eq!(post.visibility, Visibility::Public);
        assert_eq!(
            library.delete_post(&post.id).map(|c| c.into_value()),
            Guarded::Proceed(1)
        );
    }

    #[test]
    fn private_lists_stay_visible_to_their_owner() {
        let library = library(Arc::new(MemoryStorage::new()));
        library.login("alice").unwrap();
        library.collections().liked.toggle(video("v1")).unwrap();
        library.collections().subscriptions.toggle("c1").unwrap();

        for setting in [
            PrivacySetting::LikedVideosPrivate(true),
            PrivacySetting::SubscriptionsPrivate(true),
        ] {
            library.set_setting(setting).proceeded().unwrap();
        }

        let collections = library.collections();
        assert!(collections.settings.is_enabled("liked_videos_private"));
        assert!(collections.settings.is_enabled("subscriptions_private"));
        assert!(collections.liked.is_liked("v1"));
        assert!(collections.subscriptions.is_subscribed("c1"));
    }

    #[test]
    fn subscriptions_survive_login() {
        let library = library(Arc::new(MemoryStorage::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = library.subscribe(move |event| {
            sink.lock().unwrap().push(event.event_type());
        });

        library.login("alice").unwrap();
        library.collections().subscriptions.toggle("c1").unwrap();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &["logged_in", "item_added"]
        );
    }

    #[test]
    fn session_events_see_the_new_namespace() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        storage
            .set(
                "liked_videos_alice",
                &serde_json::to_string(&vec![video("v1")]).unwrap(),
            )
            .unwrap();
        let library = Arc::new(library(storage));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let weak = Arc::downgrade(&library);
        let _subscription = library.subscribe(move |event| {
            if let Some(library) = weak.upgrade() {
                let liked = library.collections().liked.is_liked("v1");
                sink.lock().unwrap().push((event.event_type(), liked));
            }
        });

        library.login("alice").unwrap();
        library.logout().unwrap();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[("logged_in", true), ("logged_out", false)]
        );
    }

    #[test]
    fn history_bound_comes_from_config() {
        let config = AppConfig {
            limits: LimitSettings {
                max_history_entries: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let library = Library::open(Arc::new(MemoryStorage::new()), &config);
        for (i, id) in ["v1", "v2", "v3"].iter().enumerate() {
            library.watch(video(id), at(i as i64)).unwrap();
        }
        let ids: Vec<String> = library
            .collections()
            .history
            .get_all()
            .into_iter()
            .map(|entry| entry.video.id)
            .collect();
        assert_eq!(ids, vec!["v3", "v2"]);
    }

    #[test]
    fn attach_image_applies_the_configured_limit() {
        let config = AppConfig {
            limits: LimitSettings {
                max_post_image_bytes: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let library = Library::open(Arc::new(MemoryStorage::new()), &config);
        assert!(matches!(
            library.attach_image(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Err(CollectionError::ImageTooLarge { size: 8, max: 4 })
        ));
    }

    #[test]
    fn open_storage_honors_quota() {
        let config = AppConfig {
            storage_quota_bytes: Some(4),
            ..Default::default()
        };
        let storage = open_storage(&config).unwrap();
        assert!(storage.set("key", "value").is_err());
    }
}
