//! Per-thread append-only memory store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::MemoryError;
use crate::memory::search::{SearchStrategy, TokenOverlap};
use crate::memory::types::{MemoryItem, Origin};

/// Append-only log for one thread.
#[derive(Debug, Default)]
struct ThreadLog {
    items: Vec<MemoryItem>,
    next_sequence: u64,
}

/// Thread-scoped conversation memory.
///
/// Threads are created on first append. Appends take the write lock, so
/// same-thread appends are serialized and sequence numbers stay contiguous;
/// items are never overwritten or reordered. Expired items are filtered on
/// every read and physically removed by [`MemoryStore::sweep`].
pub struct MemoryStore {
    threads: RwLock<HashMap<String, ThreadLog>>,
    search: Arc<dyn SearchStrategy>,
    /// Default time-to-live applied when an append carries no expiry.
    default_ttl: Option<Duration>,
}

impl MemoryStore {
    /// Create a store with the default token-overlap search strategy.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self::with_search(default_ttl, Arc::new(TokenOverlap))
    }

    /// Create a store with a custom search strategy.
    pub fn with_search(default_ttl: Option<Duration>, search: Arc<dyn SearchStrategy>) -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            search,
            default_ttl,
        }
    }

    /// Append an item to a thread, assigning the next sequence position.
    /// Returns a snapshot of the stored item.
    ///
    /// The in-memory store cannot fail here; the `Result` is the contract
    /// alternative backends report `Unavailable` through.
    pub async fn append(
        &self,
        thread_id: &str,
        origin: Origin,
        payload: serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<MemoryItem, MemoryError> {
        let now = Utc::now();
        let expires_at = expires_at.or_else(|| {
            self.default_ttl
                .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
                .map(|ttl| now + ttl)
        });

        let mut threads = self.threads.write().await;
        let log = threads.entry(thread_id.to_string()).or_default();

        let item = MemoryItem {
            id: uuid::Uuid::new_v4(),
            sequence: log.next_sequence,
            timestamp: now,
            origin,
            payload,
            expires_at,
        };
        log.next_sequence += 1;
        log.items.push(item.clone());
        Ok(item)
    }

    /// Get a thread's items in insertion order, expired items excluded.
    /// With `limit`, only the most recent `limit` items are returned.
    pub async fn get(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryItem>, MemoryError> {
        let now = Utc::now();
        let threads = self.threads.read().await;
        let log = threads
            .get(thread_id)
            .ok_or_else(|| MemoryError::ThreadNotFound {
                thread_id: thread_id.to_string(),
            })?;

        let live: Vec<MemoryItem> = log
            .items
            .iter()
            .filter(|item| !item.is_expired(now))
            .cloned()
            .collect();

        Ok(match limit {
            Some(n) => {
                let start = live.len().saturating_sub(n);
                live[start..].to_vec()
            }
            None => live,
        })
    }

    /// Search a thread's unexpired items, most relevant first.
    pub async fn search(
        &self,
        thread_id: &str,
        query: &str,
    ) -> Result<Vec<MemoryItem>, MemoryError> {
        let live = self.get(thread_id, None).await?;
        Ok(self.search.rank(query, &live))
    }

    /// Remove expired items across all threads. Returns the number removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut threads = self.threads.write().await;
        let mut removed = 0;
        for log in threads.values_mut() {
            let before = log.items.len();
            log.items.retain(|item| !item.is_expired(now));
            removed += before - log.items.len();
        }
        removed
    }

    /// Number of known threads.
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(content: &str) -> serde_json::Value {
        serde_json::json!({"content": content})
    }

    #[tokio::test]
    async fn appends_are_retrieved_in_order() {
        let store = MemoryStore::new(None);
        store.append("t1", Origin::User, payload("a"), None).await.unwrap();
        store.append("t1", Origin::Agent, payload("b"), None).await.unwrap();
        store.append("t1", Origin::User, payload("c"), None).await.unwrap();

        let items = store.get("t1", None).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].payload, payload("a"));
        assert_eq!(items[1].payload, payload("b"));
        assert_eq!(items[2].payload, payload("c"));
        assert_eq!(
            items.iter().map(|i| i.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn unknown_thread_is_not_found() {
        let store = MemoryStore::new(None);
        assert!(matches!(
            store.get("missing", None).await,
            Err(MemoryError::ThreadNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn limit_returns_most_recent() {
        let store = MemoryStore::new(None);
        store.append("t1", Origin::User, payload("old"), None).await.unwrap();
        store.append("t1", Origin::Agent, payload("new"), None).await.unwrap();

        let items = store.get("t1", Some(1)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].payload, payload("new"));
    }

    #[tokio::test]
    async fn expired_items_are_hidden_from_get_and_search() {
        let store = MemoryStore::new(None);
        let past = Utc::now() - chrono::Duration::seconds(1);
        store
            .append("t1", Origin::User, payload("rust memory"), Some(past))
            .await.unwrap();
        store
            .append("t1", Origin::User, payload("rust ownership"), None)
            .await.unwrap();

        let items = store.get("t1", None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].payload, payload("rust ownership"));

        let found = store.search("t1", "rust").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload, payload("rust ownership"));
    }

    #[tokio::test]
    async fn sweep_removes_expired_items() {
        let store = MemoryStore::new(None);
        let past = Utc::now() - chrono::Duration::seconds(1);
        store.append("t1", Origin::User, payload("gone"), Some(past)).await.unwrap();
        store.append("t2", Origin::User, payload("kept"), None).await.unwrap();

        assert_eq!(store.sweep().await, 1);
        assert_eq!(store.get("t1", None).await.unwrap().len(), 0);
        assert_eq!(store.get("t2", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn default_ttl_applies_when_no_expiry_given() {
        let store = MemoryStore::new(Some(Duration::from_secs(3600)));
        let item = store.append("t1", Origin::User, payload("a"), None).await.unwrap();
        assert!(item.expires_at.is_some());

        // An explicit expiry wins over the default.
        let explicit = Utc::now() + chrono::Duration::seconds(5);
        let item = store
            .append("t1", Origin::User, payload("b"), Some(explicit))
            .await.unwrap();
        assert_eq!(item.expires_at, Some(explicit));
    }

    #[tokio::test]
    async fn threads_do_not_interfere() {
        let store = MemoryStore::new(None);
        store.append("a", Origin::User, payload("1"), None).await.unwrap();
        store.append("b", Origin::User, payload("2"), None).await.unwrap();
        store.append("a", Origin::User, payload("3"), None).await.unwrap();

        let a = store.get("a", None).await.unwrap();
        let b = store.get("b", None).await.unwrap();
        assert_eq!(a.iter().map(|i| i.sequence).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(b[0].sequence, 0);
        assert_eq!(store.thread_count().await, 2);
    }

    #[tokio::test]
    async fn concurrent_appends_keep_sequences_contiguous() {
        let store = Arc::new(MemoryStore::new(None));
        let n = 50;

        let handles: Vec<_> = (0..n)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .append("t1", Origin::User, payload(&format!("m{i}")), None)
                        .await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let items = store.get("t1", None).await.unwrap();
        assert_eq!(items.len(), n);
        let mut sequences: Vec<u64> = items.iter().map(|i| i.sequence).collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (0..n as u64).collect::<Vec<_>>());
    }
}
