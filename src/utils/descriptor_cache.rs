use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;

use crate::biometric::Descriptor;
use crate::store::{AttendanceStore, StoreResult};

/// Enrolled face descriptors per teacher id.
#[derive(Clone)]
pub struct DescriptorCache {
    cache: Cache<u64, Arc<Vec<Descriptor>>>,
}

impl DescriptorCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached descriptors, loading from the store on a miss. Empty sets are not
    /// cached so a fresh enrollment is visible immediately.
    pub async fn get_or_load(
        &self,
        teacher_id: u64,
        store: &dyn AttendanceStore,
    ) -> StoreResult<Arc<Vec<Descriptor>>> {
        if let Some(hit) = self.cache.get(&teacher_id).await {
            return Ok(hit);
        }
        let loaded = Arc::new(store.face_descriptors(teacher_id).await?);
        if !loaded.is_empty() {
            self.cache.insert(teacher_id, loaded.clone()).await;
        }
        Ok(loaded)
    }

    pub async fn invalidate(&self, teacher_id: u64) {
        self.cache.invalidate(&teacher_id).await;
    }

    /// Insert a batch of teachers concurrently
    async fn batch_insert(&self, batch: Vec<(u64, Vec<Descriptor>)>) {
        let futures: Vec<_> = batch
            .into_iter()
            .map(|(teacher_id, descriptors)| self.cache.insert(teacher_id, Arc::new(descriptors)))
            .collect();
        futures::future::join_all(futures).await;
    }

    /// Load every enrolled teacher into the cache (batched). Returns the
    /// number of teachers cached.
    pub async fn warmup(&self, store: &dyn AttendanceStore, batch_size: usize) -> Result<usize> {
        let mut grouped: HashMap<u64, Vec<Descriptor>> = HashMap::new();
        for (teacher_id, descriptor) in store.all_face_descriptors().await? {
            grouped.entry(teacher_id).or_default().push(descriptor);
        }
        let total = grouped.len();

        let mut batch = Vec::with_capacity(batch_size);
        for entry in grouped {
            batch.push(entry);
            if batch.len() >= batch_size {
                self.batch_insert(std::mem::take(&mut batch)).await;
            }
        }
        if !batch.is_empty() {
            self.batch_insert(batch).await;
        }

        log::info!("Descriptor cache warmup complete: {} enrolled teachers", total);
        Ok(total)
    }
}
