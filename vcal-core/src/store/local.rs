//! File-backed event store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use super::{EventFile, EventStore};
use crate::error::{VcalError, VcalResult};
use crate::event::{Event, EventDraft};

/// Events kept in a JSON file on the local disk.
///
/// Every operation re-reads the file, so edits made by another process are
/// picked up. Writes are serialized through one lock and publish the new
/// collection to subscribers.
pub struct LocalStore {
    file: EventFile,
    write_lock: Mutex<()>,
    snapshots: watch::Sender<Vec<Event>>,
}

impl LocalStore {
    pub async fn open(path: impl Into<PathBuf>) -> VcalResult<Self> {
        let file = EventFile::new(path);
        let events = file.read().await?;
        debug!("Opened {} with {} events", file.path().display(), events.len());

        let (snapshots, _) = watch::channel(events);

        Ok(LocalStore {
            file,
            write_lock: Mutex::new(()),
            snapshots,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read-modify-write the whole collection under the write lock.
    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Event>) -> VcalResult<T> + Send,
    ) -> VcalResult<T> {
        let _guard = self.write_lock.lock().await;

        let mut events = self.file.read().await?;
        let result = change(&mut events)?;
        self.file.write(&events).await?;
        self.snapshots.send_replace(events);

        Ok(result)
    }
}

#[async_trait]
impl EventStore for LocalStore {
    async fn list_events(&self) -> VcalResult<Vec<Event>> {
        self.file.read().await
    }

    async fn create_event(&self, draft: EventDraft) -> VcalResult<Event> {
        draft.validate()?;
        let event = Event::create(draft);

        let created = event.clone();
        self.modify(move |events| {
            events.push(event);
            Ok(())
        })
        .await?;

        debug!("Created event {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn update_event(&self, event: Event) -> VcalResult<Event> {
        event.validate()?;

        let updated = event.clone();
        self.modify(move |events| {
            let slot = events
                .iter_mut()
                .find(|e| e.id == event.id)
                .ok_or_else(|| VcalError::NotFound(event.id.clone()))?;
            *slot = event;
            Ok(())
        })
        .await?;

        debug!("Updated event {}", updated.id);
        Ok(updated)
    }

    async fn delete_event(&self, id: &str) -> VcalResult<()> {
        let removed = self
            .modify(|events| {
                let before = events.len();
                events.retain(|e| e.id != id);
                Ok(before - events.len())
            })
            .await?;

        debug!("Deleted {} event(s) with id {}", removed, id);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Event>> {
        self.snapshots.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrenceRule;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn open_temp() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("events.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists() {
        let (dir, store) = open_temp().await;

        let created = store
            .create_event(EventDraft::new("Dentist", date(2024, 3, 12)))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let reopened = LocalStore::open(dir.path().join("events.json")).await.unwrap();
        assert_eq!(reopened.list_events().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let (_dir, store) = open_temp().await;
        let a = store.create_event(EventDraft::new("A", date(2024, 1, 1))).await.unwrap();
        let b = store.create_event(EventDraft::new("B", date(2024, 1, 1))).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn create_rejects_invalid_drafts() {
        let (_dir, store) = open_temp().await;
        let err = store
            .create_event(EventDraft::new("", date(2024, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, VcalError::InvalidEvent(_)));
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let (_dir, store) = open_temp().await;
        let first = store.create_event(EventDraft::new("First", date(2024, 1, 1))).await.unwrap();
        let second = store.create_event(EventDraft::new("Second", date(2024, 1, 2))).await.unwrap();

        let mut edited = first.clone();
        edited.title = "First (moved)".into();
        edited.recurrence.rule = RecurrenceRule::Weekly;
        store.update_event(edited.clone()).await.unwrap();

        assert_eq!(store.list_events().await.unwrap(), vec![edited, second]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_dir, store) = open_temp().await;
        let ghost = Event::from_draft("ghost", EventDraft::new("Ghost", date(2024, 1, 1)));

        let err = store.update_event(ghost).await.unwrap_err();
        assert!(matches!(err, VcalError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn delete_removes_and_ignores_unknown() {
        let (_dir, store) = open_temp().await;
        let keep = store.create_event(EventDraft::new("Keep", date(2024, 1, 1))).await.unwrap();
        let gone = store.create_event(EventDraft::new("Drop", date(2024, 1, 1))).await.unwrap();

        store.delete_event(&gone.id).await.unwrap();
        store.delete_event("never-existed").await.unwrap();

        assert_eq!(store.list_events().await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn writes_publish_snapshots() {
        let (_dir, store) = open_temp().await;
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        let created = store.create_event(EventDraft::new("Ping", date(2024, 1, 1))).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), vec![created.clone()]);

        store.delete_event(&created.id).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }
}
