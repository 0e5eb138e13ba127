use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{SuppressionConfig, SuppressionConfigSource};

struct CachedConfig {
    config: SuppressionConfig,
    fetched_at: Instant,
}

/// Process-wide cache in front of the suppression source. Entries are served
/// for `ttl` after they were fetched; `invalidate` drops them immediately.
pub struct SuppressionCache {
    source: Arc<dyn SuppressionConfigSource>,
    ttl: Duration,
    entry: Mutex<Option<CachedConfig>>,
}

impl SuppressionCache {
    pub fn new(source: Arc<dyn SuppressionConfigSource>, ttl: Duration) -> SuppressionCache {
        SuppressionCache {
            source,
            ttl,
            entry: Mutex::new(None),
        }
    }

    #[tracing::instrument(name = "Read the suppression configuration", skip(self))]
    pub async fn get(&self) -> SuppressionConfig {
        // Holding the lock across the fetch keeps concurrent misses to one request
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return cached.config.clone();
            }
        }

        let config = match self.source.fetch().await {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Suppression configuration unavailable, pausing sends: {:?}",
                    err
                );
                SuppressionConfig::fail_closed()
            }
        };

        *entry = Some(CachedConfig {
            config: config.clone(),
            fetched_at: Instant::now(),
        });

        config
    }

    #[tracing::instrument(name = "Invalidate the suppression configuration", skip(self))]
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}
