//! Badge catalogue cache
//! Mission: Avoid reloading every badge definition on each eligibility check

use crate::badges::models::Badge;
use crate::store::Database;
use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct BadgeCatalog {
    ttl: Duration,
    cached: RwLock<Option<(Instant, Arc<Vec<Badge>>)>>,
}

impl BadgeCatalog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Current definitions, reloaded from storage once the entry is older than the TTL.
    pub async fn get(&self, db: &Database) -> Result<Arc<Vec<Badge>>> {
        if let Some(badges) = self.fresh() {
            return Ok(badges);
        }

        // The lock is never held across the await
        let badges = Arc::new(db.list_badges().await?);
        debug!(count = badges.len(), "Badge catalogue reloaded");
        *self.cached.write() = Some((Instant::now(), badges.clone()));
        Ok(badges)
    }

    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    fn fresh(&self) -> Option<Arc<Vec<Badge>>> {
        let guard = self.cached.read();
        match guard.as_ref() {
            Some((loaded_at, badges)) if loaded_at.elapsed() < self.ttl => Some(badges.clone()),
            _ => None,
        }
    }
}
