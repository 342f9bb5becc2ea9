use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use moka::future::Cache;
use products_leads::{Lead, LeadSnapshot};
use tracing::{info, warn};

use crate::{auth::TokenCache, client::ZohoClient, error::ZohoResult};

/// Validity windows for the two in-memory caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    pub leads_ttl: Duration,
    pub token_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            leads_ttl: Duration::from_secs(60 * 60),
            token_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// The full lead dataset, fetched on demand and held for `leads_ttl`.
#[derive(Clone, Debug)]
pub struct LeadCache {
    client: ZohoClient,
    tokens: TokenCache,
    snapshots: Cache<(), Arc<LeadSnapshot>>,
}

impl LeadCache {
    pub fn new(client: ZohoClient, settings: CacheSettings) -> Self {
        let tokens = TokenCache::new(client.clone(), settings.token_ttl);
        Self {
            client,
            tokens,
            snapshots: Cache::builder()
                .max_capacity(1)
                .time_to_live(settings.leads_ttl)
                .build(),
        }
    }

    /// Cached snapshot, loading it from the CRM when missing or expired.
    pub async fn snapshot(&self) -> ZohoResult<Arc<LeadSnapshot>> {
        self.snapshots
            .try_get_with((), self.load())
            .await
            .map_err(|err| (*err).clone())
    }

    /// Drop the cached snapshot and load a fresh one.
    pub async fn refresh(&self) -> ZohoResult<Arc<LeadSnapshot>> {
        self.snapshots.invalidate(&()).await;
        self.snapshot().await
    }

    /// Cached snapshot if one is live; never touches the network.
    pub async fn peek(&self) -> Option<Arc<LeadSnapshot>> {
        self.snapshots.get(&()).await
    }

    async fn load(&self) -> ZohoResult<Arc<LeadSnapshot>> {
        let started = Instant::now();
        let token = self.tokens.access_token().await?;
        let raw = match self.client.fetch_all_leads(&token).await {
            Ok(raw) => raw,
            Err(err) => {
                if err.is_unauthorized() {
                    warn!("access token rejected; dropping cached token");
                    self.tokens.invalidate().await;
                }
                return Err(err);
            }
        };
        let leads: Vec<Lead> = raw.into_iter().map(Lead::from).collect();
        info!(
            leads = leads.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lead snapshot loaded from Zoho"
        );
        Ok(Arc::new(LeadSnapshot::new(leads)))
    }
}
