use crate::model::InstanceId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Cache entry for one instance's payload
#[derive(Clone, Debug)]
struct CacheEntry {
    payload: Value,
    fetched_at: Instant,
    fetched_at_rfc3339: String,
}

/// Metadata about a cached payload
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPayload {
    pub instance_id: InstanceId,
    pub fetched_at: String,
    pub payload: Value,
}

/// Latest fetched payload per instance, with TTL.
///
/// A refetch overwrites the previous entry. A failed fetch should invalidate it so
/// the instance shows up as missing in the next comparison.
#[derive(Debug)]
pub struct PayloadCache {
    entries: Arc<RwLock<HashMap<InstanceId, CacheEntry>>>,
    ttl: Duration,
}

impl PayloadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Store a freshly fetched payload, replacing any previous one
    pub async fn put(&self, instance_id: &str, payload: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(
            instance_id.to_string(),
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
                fetched_at_rfc3339: crate::model::now_rfc3339(),
            },
        );
        log::debug!("Cached payload for instance '{}'", instance_id);
    }

    /// Get a cached payload if present and not expired
    pub async fn get(&self, instance_id: &str) -> Option<CachedPayload> {
        let mut entries = self.entries.write().await;

        let entry = entries.get(instance_id)?;
        if entry.fetched_at.elapsed() > self.ttl {
            entries.remove(instance_id);
            return None;
        }
        Some(CachedPayload {
            instance_id: instance_id.to_string(),
            fetched_at: entry.fetched_at_rfc3339.clone(),
            payload: entry.payload.clone(),
        })
    }

    /// Payloads of the given instances as of now; expired or absent ones are left out
    pub async fn snapshot(&self, instance_ids: &[InstanceId]) -> HashMap<InstanceId, Value> {
        let entries = self.entries.read().await;
        instance_ids
            .iter()
            .filter_map(|id| {
                entries
                    .get(id)
                    .filter(|entry| entry.fetched_at.elapsed() <= self.ttl)
                    .map(|entry| (id.clone(), entry.payload.clone()))
            })
            .collect()
    }

    /// Remove an instance's payload (e.g. after its fetch failed)
    pub async fn invalidate(&self, instance_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(instance_id).is_some()
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.fetched_at.elapsed() <= ttl);
        before - entries.len()
    }

    /// Run `cleanup_expired` every `period` on the current runtime
    pub fn spawn_cleanup(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = self.cleanup_expired().await;
                if removed > 0 {
                    log::debug!("Dropped {} expired payloads", removed);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for PayloadCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600)) // 1 hour
    }
}
