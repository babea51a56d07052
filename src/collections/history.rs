//! Watch history, newest first, one entry per video.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fmt;

use super::{
    ChangeNotifier, CollectionError, CollectionKind, CollectionStore, Committed, HistoryEntry,
    InsertPolicy, Subscription, VideoRef,
};
use crate::events::ChangeEvent;
use crate::storage::{PersistenceAdapter, StorageKey};

pub struct HistoryStore {
    store: CollectionStore<HistoryEntry>,
}

impl HistoryStore {
    pub fn open(
        handle: Option<&str>,
        max_entries: Option<usize>,
        persistence: PersistenceAdapter,
        notifier: ChangeNotifier,
    ) -> Self {
        let kind = CollectionKind::History;
        HistoryStore {
            store: CollectionStore::open(
                kind,
                StorageKey::scoped(kind.key_prefix(), handle),
                InsertPolicy::BumpToFront,
                max_entries,
                persistence,
                notifier,
            ),
        }
    }

    /// Records that `video` was watched at `watched_at`. Watching a video
    /// again replaces its entry. Entries stay newest first by `watched_at`,
    /// so a late report of an older watch lands behind newer ones.
    pub fn record_watch(
        &self,
        video: VideoRef,
        watched_at: DateTime<Utc>,
    ) -> Result<Committed<()>, CollectionError> {
        let committed = self.store.add(HistoryEntry { video, watched_at })?;
        Ok(committed.map(|_| ()))
    }

    pub fn get_all(&self) -> Vec<HistoryEntry> {
        self.store.get_all()
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.store.contains(video_id)
    }

    pub fn last_watched(&self, video_id: &str) -> Option<DateTime<Utc>> {
        self.store.get(video_id).map(|entry| entry.watched_at)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn remove(&self, video_id: &str) -> Committed<usize> {
        self.store.remove(video_id)
    }

    pub fn clear(&self) -> Committed<()> {
        self.store.clear()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// The current history bucketed by day relative to `now`.
    pub fn grouped_by_day<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayGroup> {
        group_by_day(&self.store.get_all(), now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => f.write_str("Today"),
            DayLabel::Yesterday => f.write_str("Yesterday"),
            DayLabel::Date(date) => write!(f, "{}", date.format("%b %-d, %Y")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub label: DayLabel,
    pub entries: Vec<HistoryEntry>,
}

/// Buckets `entries` into consecutive day groups, keeping their order.
///
/// Days are calendar days in `now`'s time zone. Nothing is stored, so the
/// same entries move from "Today" to "Yesterday" once `now` crosses midnight.
pub fn group_by_day<Tz: TimeZone>(entries: &[HistoryEntry], now: &DateTime<Tz>) -> Vec<DayGroup> {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt();

    let mut groups: Vec<DayGroup> = Vec::new();
    for entry in entries {
        let day = entry.watched_at.with_timezone(&tz).date_naive();
        let label = if day == today {
            DayLabel::Today
        } else if Some(day) == yesterday {
            DayLabel::Yesterday
        } else {
            DayLabel::Date(day)
        };

        match groups.last_mut() {
            Some(group) if group.label == label => group.entries.push(entry.clone()),
            _ => groups.push(DayGroup {
                label,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use chrono::FixedOffset;
    use std::sync::Arc;

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

    fn entry(id: &str, watched_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            video: video(id),
            watched_at,
        }
    }

    fn history() -> HistoryStore {
        HistoryStore::open(
            None,
            None,
            PersistenceAdapter::new(Arc::new(MemoryStorage::new())),
            ChangeNotifier::new(),
        )
    }

    #[test]
    fn rewatching_bumps_instead_of_duplicating() {
        let history = history();
        history.record_watch(video("v1"), at(100)).unwrap();
        history.record_watch(video("v2"), at(200)).unwrap();
        history.record_watch(video("v1"), at(300)).unwrap();

        assert_eq!(
            history.get_all(),
            vec![entry("v1", at(300)), entry("v2", at(200))]
        );
        assert_eq!(history.last_watched("v1"), Some(at(300)));
    }

    #[test]
    fn late_watches_are_placed_by_time() {
        let history = history();
        history.record_watch(video("v2"), at(200)).unwrap();
        history.record_watch(video("v1"), at(100)).unwrap();
        history.record_watch(video("v3"), at(150)).unwrap();

        let times: Vec<i64> = history
            .get_all()
            .iter()
            .map(|entry| entry.watched_at.timestamp())
            .collect();
        assert_eq!(times, vec![200, 150, 100]);

        history.record_watch(video("v2"), at(50)).unwrap();
        assert_eq!(
            history.get_all(),
            vec![entry("v3", at(150)), entry("v1", at(100)), entry("v2", at(50))]
        );
    }

    #[test]
    fn late_watch_does_not_split_day_groups() {
        let day = 86_400;
        let history = history();
        history.record_watch(video("v1"), at(10 * day + 60)).unwrap();
        history.record_watch(video("v2"), at(9 * day)).unwrap();
        history.record_watch(video("v3"), at(10 * day + 30)).unwrap();

        let labels: Vec<DayLabel> = history
            .grouped_by_day(&at(10 * day + 3_600))
            .into_iter()
            .map(|group| group.label)
            .collect();
        assert_eq!(labels, vec![DayLabel::Today, DayLabel::Yesterday]);
    }

    #[test]
    fn out_of_order_persisted_history_opens_newest_first() {
        let storage = Arc::new(MemoryStorage::new());
        let persisted = vec![entry("v1", at(100)), entry("v2", at(300))];
        storage
            .set(
                "watch_history_anonymous",
                &serde_json::to_string(&persisted).unwrap(),
            )
            .unwrap();

        let history = HistoryStore::open(
            None,
            None,
            PersistenceAdapter::new(storage),
            ChangeNotifier::new(),
        );
        assert_eq!(
            history.get_all(),
            vec![entry("v2", at(300)), entry("v1", at(100))]
        );
    }

    #[test]
    fn history_is_scoped_by_handle() {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = PersistenceAdapter::new(storage.clone());
        let alice = HistoryStore::open(
            Some("alice"),
            None,
            persistence.clone(),
            ChangeNotifier::new(),
        );
        alice.record_watch(video("v1"), at(100)).unwrap();

        let anonymous = HistoryStore::open(None, None, persistence, ChangeNotifier::new());
        assert!(anonymous.is_empty());
        assert!(storage.get("watch_history_alice").unwrap().is_some());
    }

    #[test]
    fn groups_today_yesterday_and_older() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let entries = vec![
            entry("v1", Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()),
            entry("v2", Utc.with_ymd_and_hms(2026, 10, 16, 0, 30, 0).unwrap()),
            entry("v3", Utc.with_ymd_and_hms(2026, 10, 15, 23, 0, 0).unwrap()),
            entry("v4", Utc.with_ymd_and_hms(2026, 10, 3, 8, 0, 0).unwrap()),
        ];

        let groups = group_by_day(&entries, &now);
        let summary: Vec<(String, usize)> = groups
            .iter()
            .map(|g| (g.label.to_string(), g.entries.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Today".to_string(), 2),
                ("Yesterday".to_string(), 1),
                ("Oct 3, 2026".to_string(), 1),
            ]
        );
    }

    #[test]
    fn grouping_is_relative_to_now() {
        let entries = vec![entry(
            "v1",
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
        )];
        let today = Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap();

        assert_eq!(group_by_day(&entries, &today)[0].label, DayLabel::Today);
        assert_eq!(group_by_day(&entries, &today), group_by_day(&entries, &today));
        assert_eq!(
            group_by_day(&entries, &tomorrow)[0].label,
            DayLabel::Yesterday
        );
    }

    #[test]
    fn grouping_uses_the_callers_time_zone() {
        // 23:30 UTC is already the next day at UTC+2.
        let entries = vec![entry(
            "v1",
            Utc.with_ymd_and_hms(2026, 10, 15, 23, 30, 0).unwrap(),
        )];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();

        assert_eq!(group_by_day(&entries, &now)[0].label, DayLabel::Today);
        assert_eq!(
            group_by_day(&entries, &now.with_timezone(&Utc))[0].label,
            DayLabel::Yesterday
        );
    }

    #[test]
    fn empty_history_has_no_groups() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert!(group_by_day(&[], &now).is_empty());
        assert!(history().grouped_by_day(&now).is_empty());
    }
}
