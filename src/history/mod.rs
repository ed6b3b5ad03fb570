//! Client-local log of sign/verify attempts.
//!
//! The log is one JSON array persisted under a single key, newest first,
//! unique by id and capped at [`MAX_HISTORY`] entries. Several store
//! instances may share the same blob; each write is followed by a
//! `history-updated` notification so siblings re-read it. The
//! read-modify-write cycle is not atomic across instances, so two
//! concurrent writers can still lose one update.

pub mod notify;
pub mod storage;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

pub use notify::{BroadcastNotifier, HistoryEvent, Notifier};
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore, StorageError};

pub const STORAGE_KEY: &str = "web3_message_history";
pub const MAX_HISTORY: usize = 100;

/// A recorded attempt, as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(default)]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub recovered_address: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub verification_result: Value,
}

/// A history item before its id is derived. Absent signature or address
/// fields are empty strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewHistoryItem {
    pub message: String,
    pub signature: String,
    pub recovered_address: String,
    pub verified: bool,
    pub timestamp: String,
    pub verification_result: Value,
}

impl NewHistoryItem {
    /// Item stamped with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ..Self::default()
        }
    }

    pub fn id(&self) -> String {
        make_id(&self.signature, &self.recovered_address, &self.message)
    }

    fn into_item(self) -> HistoryItem {
        HistoryItem {
            id: self.id(),
            message: self.message,
            signature: self.signature,
            recovered_address: self.recovered_address,
            verified: self.verified,
            timestamp: self.timestamp,
            verification_result: self.verification_result,
        }
    }
}

/// Dedup key: `signature|recoveredAddress|message`.
pub fn make_id(signature: &str, recovered_address: &str, message: &str) -> String {
    format!("{}|{}|{}", signature, recovered_address, message)
}

/// Fills missing ids and drops later duplicates, keeping order.
fn dedup(items: Vec<HistoryItem>) -> Vec<HistoryItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|mut item| {
            if item.id.is_empty() {
                item.id = make_id(&item.signature, &item.recovered_address, &item.message);
            }
            seen.insert(item.id.clone()).then_some(item)
        })
        .collect()
}

pub struct HistoryStore<S, N> {
    storage: S,
    notifier: N,
    events: Mutex<broadcast::Receiver<HistoryEvent>>,
    view: Mutex<Vec<HistoryItem>>,
}

impl<S: BlobStore, N: Notifier> HistoryStore<S, N> {
    /// Opens a store over `storage` and loads the current log.
    pub fn new(storage: S, notifier: N) -> Self {
        let events = Mutex::new(notifier.subscribe());
        let store = Self {
            storage,
            notifier,
            events,
            view: Mutex::new(Vec::new()),
        };
        store.refresh();
        store
    }

    fn read_persisted(&self) -> Vec<HistoryItem> {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read message history");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
            Ok(items) => dedup(items),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable message history");
                Vec::new()
            }
        }
    }

    /// Persists `items` and notifies siblings. Failures are logged and
    /// swallowed.
    fn write(&self, items: &[HistoryItem]) {
        let result = serde_json::to_string(items)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(STORAGE_KEY, &json));

        match result {
            Ok(()) => self.notifier.publish(HistoryEvent::HistoryUpdated),
            Err(e) => warn!(error = %e, "Failed to persist message history"),
        }
    }

    fn set_view(&self, items: Vec<HistoryItem>) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// Records an attempt. Returns `false` when an item with the same id
    /// already exists, in which case nothing is written.
    pub fn add(&self, item: NewHistoryItem) -> bool {
        let mut current = self.read_persisted();
        let item = item.into_item();

        if current.iter().any(|existing| existing.id == item.id) {
            debug!(id = %item.id, "History item already recorded");
            self.set_view(current);
            return false;
        }

        current.insert(0, item);
        current.truncate(MAX_HISTORY);

        self.write(&current);
        self.set_view(current);
        true
    }

    pub fn clear(&self) {
        self.write(&[]);
        self.set_view(Vec::new());
    }

    /// Fresh read of the persisted log, newest first.
    pub fn list(&self) -> Vec<HistoryItem> {
        let items = self.read_persisted();
        self.set_view(items.clone());
        items
    }

    /// Item at `index` in the in-memory view.
    pub fn get(&self, index: usize) -> Option<HistoryItem> {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Removes the item at `index` of the in-memory view and persists the
    /// rest. Positions may be stale if a sibling wrote since the last read;
    /// prefer [`remove_by_id`](Self::remove_by_id).
    pub fn remove(&self, index: usize) -> Option<HistoryItem> {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        if index >= view.len() {
            return None;
        }
        let removed = view.remove(index);
        self.write(&view);
        Some(removed)
    }

    /// Removes the item with `id` from the persisted log.
    pub fn remove_by_id(&self, id: &str) -> bool {
        let mut current = self.read_persisted();
        let before = current.len();
        current.retain(|item| item.id != id);
        let removed = current.len() != before;
        if removed {
            self.write(&current);
        }
        self.set_view(current);
        removed
    }

    /// Replaces the in-memory view with the persisted log.
    pub fn refresh(&self) {
        let items = self.read_persisted();
        self.set_view(items);
    }

    /// Drains queued notifications and refreshes if any arrived.
    pub fn sync_pending(&self) -> bool {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = false;
        loop {
            match events.try_recv() {
                Ok(HistoryEvent::HistoryUpdated) | Err(TryRecvError::Lagged(_)) => updated = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        drop(events);

        if updated {
            self.refresh();
        }
        updated
    }

    /// Refreshes on every notification until the channel closes.
    pub async fn run_sync(&self) {
        let mut events = self.notifier.subscribe();
        loop {
            match events.recv().await {
                Ok(HistoryEvent::HistoryUpdated) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    self.refresh()
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// The in-memory view without touching storage.
    pub fn snapshot(&self) -> Vec<HistoryItem> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    type MemoryStore = HistoryStore<MemoryBlobStore, BroadcastNotifier>;

    fn store() -> MemoryStore {
        HistoryStore::new(MemoryBlobStore::new(), BroadcastNotifier::default())
    }

    fn item(n: usize) -> NewHistoryItem {
        NewHistoryItem {
            message: format!("message {}", n),
            signature: format!("0x{:0130x}", n),
            recovered_address: "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".to_string(),
            verified: true,
            timestamp: format!("2024-01-01T00:00:{:02}.000Z", n % 60),
            verification_result: json!({ "success": true }),
        }
    }

    #[test]
    fn test_add_prepends_with_derived_id() {
        let store = store();
        assert!(store.add(item(1)));
        assert!(store.add(item(2)));

        let items = store.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].message, "message 2");
        assert_eq!(
            items[1].id,
            format!("{}|{}|message 1", item(1).signature, item(1).recovered_address)
        );
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let store = store();
        assert!(store.add(item(7)));

        let mut again = item(7);
        again.timestamp = "2030-01-01T00:00:00.000Z".to_string();
        again.verified = false;
        assert!(!store.add(again));

        let items = store.list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].timestamp, item(7).timestamp);
        assert!(items[0].verified);
    }

    #[test]
    fn test_failed_attempt_uses_empty_placeholders() {
        let store = store();
        store.add(NewHistoryItem {
            message: "unsigned".to_string(),
            ..NewHistoryItem::default()
        });
        assert_eq!(store.list()[0].id, "||unsigned");
    }

    #[test]
    fn test_eviction_keeps_newest_hundred() {
        let store = store();
        for n in 0..=MAX_HISTORY {
            store.add(item(n));
        }

        let items = store.list();
        assert_eq!(items.len(), MAX_HISTORY);
        assert_eq!(items[0].message, format!("message {}", MAX_HISTORY));
        assert!(items.iter().all(|i| i.message != "message 0"));
        assert_eq!(items[MAX_HISTORY - 1].message, "message 1");
    }

    #[test]
    fn test_clear_empties_log() {
        let store = store();
        store.add(item(1));
        store.clear();
        assert!(store.list().is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_remove_by_index_uses_view() {
        let store = store();
        for n in 0..3 {
            store.add(item(n));
        }
        let removed = store.remove(1).unwrap();
        assert_eq!(removed.message, "message 1");
        assert!(store.remove(5).is_none());

        let messages: Vec<_> = store.list().into_iter().map(|i| i.message).collect();
        assert_eq!(messages, vec!["message 2", "message 0"]);
    }

    #[test]
    fn test_remove_by_id() {
        let store = store();
        store.add(item(1));
        store.add(item(2));

        assert!(store.remove_by_id(&item(1).id()));
        assert!(!store.remove_by_id("unknown"));
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(0).unwrap().message, "message 2");
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_unreadable_blob_reads_as_empty() {
        let blobs = MemoryBlobStore::new();
        blobs.set(STORAGE_KEY, "{not json").unwrap();
        let store = HistoryStore::new(blobs, BroadcastNotifier::default());
        assert!(store.list().is_empty());

        store.add(item(1));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_read_fills_ids_and_drops_duplicates() {
        let blobs = MemoryBlobStore::new();
        let raw = json!([
            { "message": "a", "signature": "0x1", "recoveredAddress": "0xA" },
            { "id": "0x1|0xA|a", "message": "a", "signature": "0x1", "recoveredAddress": "0xA" },
            { "message": "b" }
        ]);
        blobs.set(STORAGE_KEY, &raw.to_string()).unwrap();

        let items = HistoryStore::new(blobs, BroadcastNotifier::default()).list();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["0x1|0xA|a", "||b"]);
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let store = HistoryStore::new(MemoryBlobStore::with_quota(64), BroadcastNotifier::default());
        let mut events = store.notifier.subscribe();

        assert!(store.add(item(1)));

        // in-memory view still reflects the attempt, persisted log does not
        assert_eq!(store.snapshot().len(), 1);
        assert!(store.list().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_sibling_sees_update_after_sync() {
        let blobs = MemoryBlobStore::new();
        let notifier = BroadcastNotifier::default();
        let tab_a = HistoryStore::new(blobs.clone(), notifier.clone());
        let tab_b = HistoryStore::new(blobs, notifier);

        tab_a.add(item(1));
        assert!(tab_b.snapshot().is_empty());

        assert!(tab_b.sync_pending());
        assert_eq!(tab_b.snapshot().len(), 1);
        assert!(!tab_b.sync_pending());
    }

    #[test]
    fn test_concurrent_writers_can_lose_an_update() {
        let blobs = MemoryBlobStore::new();
        let notifier = BroadcastNotifier::default();
        let tab_a = HistoryStore::new(blobs.clone(), notifier.clone());
        let tab_b = HistoryStore::new(blobs, notifier);

        // both compute from the same base before either writes
        let base = tab_a.read_persisted();
        let mut from_a = base.clone();
        from_a.insert(0, item(1).into_item());
        let mut from_b = base;
        from_b.insert(0, item(2).into_item());
        tab_a.write(&from_a);
        tab_b.write(&from_b);

        let messages: Vec<_> = tab_a.list().into_iter().map(|i| i.message).collect();
        assert_eq!(messages, vec!["message 2"]);
    }

    #[tokio::test]
    async fn test_run_sync_refreshes_sibling() {
        let blobs = MemoryBlobStore::new();
        let notifier = BroadcastNotifier::default();
        let writer = HistoryStore::new(blobs.clone(), notifier.clone());
        let reader = Arc::new(HistoryStore::new(blobs, notifier));

        let task = tokio::spawn({
            let reader = reader.clone();
            async move { reader.run_sync().await }
        });
        tokio::task::yield_now().await;

        writer.add(item(3));
        for _ in 0..50 {
            if !reader.snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(reader.snapshot()[0].message, "message 3");
        task.abort();
    }

    #[test]
    fn test_file_backed_store_persists_across_instances() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let first = HistoryStore::new(FileBlobStore::new(dir.path()), BroadcastNotifier::default());
        first.add(item(1));
        drop(first);

        let second = HistoryStore::new(FileBlobStore::new(dir.path()), BroadcastNotifier::default());
        assert_eq!(second.snapshot().len(), 1);
        assert_eq!(second.get(0).map(|i| i.message), Some("message 1".to_string()));
        Ok(())
    }
}
