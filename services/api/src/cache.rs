//! Per-user clinic listing cache
//!
//! `GET /clinics` and the dashboard read the acting user's clinic list from
//! here first. Any write that changes a user's list (clinic creation, rename,
//! delete, user removal) invalidates the affected users' entries.

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::Clinic;

fn listing_key(user_id: Uuid) -> String {
    format!("clinics:user:{}", user_id)
}

/// Cache of clinic listings keyed by user
#[async_trait]
pub trait ClinicListCache: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<Vec<Clinic>>>;

    async fn put(&self, user_id: Uuid, clinics: &[Clinic]) -> Result<()>;

    async fn invalidate(&self, user_ids: &[Uuid]) -> Result<()>;
}

/// Redis-backed listing cache with a TTL
#[derive(Clone)]
pub struct RedisClinicListCache {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

impl RedisClinicListCache {
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl ClinicListCache for RedisClinicListCache {
    async fn get(&self, user_id: Uuid) -> Result<Option<Vec<Clinic>>> {
        self.redis_pool.get_json(&listing_key(user_id)).await
    }

    async fn put(&self, user_id: Uuid, clinics: &[Clinic]) -> Result<()> {
        self.redis_pool
            .set_json(&listing_key(user_id), clinics, Some(self.ttl_seconds))
            .await
    }

    async fn invalidate(&self, user_ids: &[Uuid]) -> Result<()> {
        let keys: Vec<String> = user_ids.iter().copied().map(listing_key).collect();
        self.redis_pool.delete_many(&keys).await?;
        Ok(())
    }
}

/// Process-local listing cache without expiry
#[derive(Debug, Clone, Default)]
pub struct MemoryClinicListCache {
    entries: Arc<Mutex<HashMap<String, Vec<Clinic>>>>,
}

impl MemoryClinicListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, user_id: Uuid) -> bool {
        self.entries.lock().await.contains_key(&listing_key(user_id))
    }
}

#[async_trait]
impl ClinicListCache for MemoryClinicListCache {
    async fn get(&self, user_id: Uuid) -> Result<Option<Vec<Clinic>>> {
        Ok(self.entries.lock().await.get(&listing_key(user_id)).cloned())
    }

    async fn put(&self, user_id: Uuid, clinics: &[Clinic]) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(listing_key(user_id), clinics.to_vec());
        Ok(())
    }

    async fn invalidate(&self, user_ids: &[Uuid]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for user_id in user_ids {
            entries.remove(&listing_key(*user_id));
        }
        Ok(())
    }
}
