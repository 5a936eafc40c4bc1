use crate::api::{with_retry, WalletApi};
use crate::cache::TtlCache;
use crate::error::RemoteError;
use crate::types::{Config, WalletEntity, WalletSnapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct WalletCache {
    wallets: TtlCache<WalletEntity>,
    wallet_lists: TtlCache<Vec<WalletEntity>>,
    snapshots: TtlCache<Vec<WalletSnapshot>>,
}

impl WalletCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            wallets: TtlCache::new(ttl),
            wallet_lists: TtlCache::new(ttl),
            snapshots: TtlCache::new(ttl),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_millis(config.wallet_cache_ttl_ms))
    }

    pub fn clear(&self) {
        self.wallets.clear();
        self.wallet_lists.clear();
        self.snapshots.clear();
    }
}

pub struct WalletDataClient<A: WalletApi> {
    api: A,
    cache: Arc<WalletCache>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl<A: WalletApi> WalletDataClient<A> {
    pub fn new(api: A, cache: Arc<WalletCache>, config: &Config) -> Self {
        Self {
            api,
            cache,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub async fn fetch_wallets(
        &self,
        user_id: &str,
        use_cache: bool,
    ) -> Result<Vec<WalletEntity>, RemoteError> {
        let key = format!("user-wallets-{}", user_id);
        if use_cache {
            if let Some(cached) = self.cache.wallet_lists.get(&key) {
                tracing::debug!("Cache hit: {}", key);
                return Ok(cached);
            }
        }

        let wallets = with_retry(self.retry_attempts, self.retry_delay, || {
            self.api.list_wallets(user_id)
        })
        .await?;
        self.cache.wallet_lists.insert(key, wallets.clone());
        Ok(wallets)
    }

    pub async fn fetch_wallet_details(
        &self,
        wallet_id: &str,
        use_cache: bool,
    ) -> Result<WalletEntity, RemoteError> {
        let key = format!("wallet-details-{}", wallet_id);
        if use_cache {
            if let Some(cached) = self.cache.wallets.get(&key) {
                tracing::debug!("Cache hit: {}", key);
                return Ok(cached);
            }
        }

        let wallet = with_retry(self.retry_attempts, self.retry_delay, || {
            self.api.get_wallet(wallet_id)
        })
        .await?;
        self.cache.wallets.insert(key, wallet.clone());
        Ok(wallet)
    }

    pub async fn fetch_wallet_snapshots(
        &self,
        wallet_id: &str,
        from: DateTime<Utc>,
        use_cache: bool,
    ) -> Result<Vec<WalletSnapshot>, RemoteError> {
        let key = format!(
            "wallet-snapshots-{}-{}",
            wallet_id,
            from.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        if use_cache {
            if let Some(cached) = self.cache.snapshots.get(&key) {
                tracing::debug!("Cache hit: {}", key);
                return Ok(cached);
            }
        }

        let snapshots = with_retry(self.retry_attempts, self.retry_delay, || {
            self.api.get_snapshots(wallet_id, from)
        })
        .await?;
        self.cache.snapshots.insert(key, snapshots.clone());
        Ok(snapshots)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Wallet cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockWalletApi;
    use chrono::TimeZone;

    fn wallet(id: &str) -> WalletEntity {
        WalletEntity {
            id: id.to_string(),
            user_id: Some("user-1".to_string()),
            name: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn client(api: MockWalletApi) -> WalletDataClient<MockWalletApi> {
        let config = Config {
            retry_attempts: 3,
            retry_delay_ms: 100,
            wallet_cache_ttl_ms: 30_000,
            ..Default::default()
        };
        WalletDataClient::new(api, Arc::new(WalletCache::from_config(&config)), &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_details_served_from_cache() {
        let mut api = MockWalletApi::new();
        api.expect_get_wallet()
            .times(2)
            .returning(|id| Ok(wallet(id)));
        let client = client(api);

        assert_eq!(client.fetch_wallet_details("w1", true).await.unwrap().id, "w1");
        assert_eq!(client.fetch_wallet_details("w1", true).await.unwrap().id, "w1");

        // Past the TTL the next read goes back to the service.
        tokio::time::advance(Duration::from_secs(31)).await;
        client.fetch_wallet_details("w1", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_bypass_cache() {
        let mut api = MockWalletApi::new();
        api.expect_list_wallets()
            .times(2)
            .returning(|_| Ok(vec![wallet("w1"), wallet("w2")]));
        let client = client(api);

        client.fetch_wallets("user-1", true).await.unwrap();
        let wallets = client.fetch_wallets("user-1", false).await.unwrap();
        assert_eq!(wallets.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_retry_then_cache() {
        let mut api = MockWalletApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_get_snapshots()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RemoteError::new(Some(503), "unavailable")));
        api.expect_get_snapshots()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, from| {
                Ok(vec![WalletSnapshot {
                    timestamp: from,
                    total_value: 1250.0,
                    cash_balance: 400.0,
                }])
            });
        let client = client(api);
        let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        let snapshots = client.fetch_wallet_snapshots("w1", from, true).await.unwrap();
        assert_eq!(snapshots[0].total_value, 1250.0);

        let cached = client.fetch_wallet_snapshots("w1", from, true).await.unwrap();
        assert_eq!(cached, snapshots);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let mut api = MockWalletApi::new();
        api.expect_get_wallet()
            .times(2)
            .returning(|id| Ok(wallet(id)));
        let client = client(api);

        client.fetch_wallet_details("w1", true).await.unwrap();
        client.clear_cache();
        client.fetch_wallet_details("w1", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_shared_cache_between_clients() {
        let config = Config::default();
        let cache = Arc::new(WalletCache::from_config(&config));

        let mut first_api = MockWalletApi::new();
        first_api.expect_get_wallet().times(1).returning(|id| Ok(wallet(id)));
        let mut second_api = MockWalletApi::new();
        second_api.expect_get_wallet().times(0);

        let first = WalletDataClient::new(first_api, Arc::clone(&cache), &config);
        let second = WalletDataClient::new(second_api, Arc::clone(&cache), &config);

        first.fetch_wallet_details("w9", true).await.unwrap();
        second.fetch_wallet_details("w9", true).await.unwrap();
    }
}
