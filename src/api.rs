use crate::error::RemoteError;
use crate::types::{
    BotCommand, BotEntity, Config, CreateBotDraft, StrategyConfig, WalletEntity, WalletSnapshot,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn create_bot(&self, draft: &CreateBotDraft) -> std::result::Result<BotEntity, RemoteError>;

    async fn update_strategy(
        &self,
        bot_id: &str,
        config: &StrategyConfig,
    ) -> std::result::Result<BotEntity, RemoteError>;

    async fn get_bot(&self, bot_id: &str) -> std::result::Result<BotEntity, RemoteError>;

    async fn list_bots(&self) -> std::result::Result<Vec<BotEntity>, RemoteError>;

    async fn control_bot(&self, bot_id: &str, command: BotCommand) -> std::result::Result<(), RemoteError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn get_wallet(&self, wallet_id: &str) -> std::result::Result<WalletEntity, RemoteError>;

    async fn list_wallets(&self, user_id: &str) -> std::result::Result<Vec<WalletEntity>, RemoteError>;

    async fn get_snapshots(
        &self,
        wallet_id: &str,
        from: DateTime<Utc>,
    ) -> std::result::Result<Vec<WalletSnapshot>, RemoteError>;
}

#[derive(Clone)]
pub struct DashboardApi {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl DashboardApi {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            access_token: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("API request: {} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, req: RequestBuilder, action: &str) -> std::result::Result<reqwest::Response, RemoteError> {
        let resp = req.send().await.map_err(|e| {
            tracing::error!("Failed to {}: {}", action, e);
            RemoteError::new(e.status().map(|s| s.as_u16()), e.to_string())
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = error_from_response(status.as_u16(), &body);
        tracing::error!("Failed to {}: {} ({})", action, err.message, status);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        action: &str,
    ) -> std::result::Result<T, RemoteError> {
        let resp = self.send(req, action).await?;
        let status = resp.status().as_u16();
        resp.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to decode {} response: {}", action, e);
            RemoteError::new(Some(status), format!("Malformed response: {}", e))
        })
    }
}

pub fn create_bot_body(draft: &CreateBotDraft) -> serde_json::Value {
    json!({
        "name": draft.name,
        "description": draft.description,
        "marketPairs": draft.market_pairs,
        "strategyConfig": draft.strategy_config,
        "walletConfig": draft.wallet_config,
        "marketData": {
            "marketDataConfig": draft.market_data,
        },
    })
}

/// Builds a [`RemoteError`] from a non-success response, preferring the
/// service's own `message` field.
pub fn error_from_response(status: u16, body: &str) -> RemoteError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match &value["message"] {
            serde_json::Value::String(msg) => Some(msg.clone()),
            // Validation pipes report a list of messages
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        });

    let message = match from_json {
        Some(msg) => msg,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("Request failed with status {}", status),
    };

    RemoteError::new(Some(status), message)
}

pub fn is_retryable(err: &RemoteError) -> bool {
    match err.status {
        None => true,
        Some(status) => status == 429 || status >= 500,
    }
}

/// Runs `op` up to `attempts` times with linear backoff (`delay * attempt`).
///
/// Only for idempotent reads: creating or updating a bot must not be replayed.
pub async fn with_retry<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> std::result::Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RemoteError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_retryable(&e) => {
                let backoff = delay * attempt;
                tracing::warn!(
                    "Attempt {}/{} failed ({}), retrying in {}ms...",
                    attempt,
                    attempts,
                    e,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

impl DashboardApi {
    fn create_bot_request(&self, draft: &CreateBotDraft) -> RequestBuilder {
        self.request(Method::POST, "bots").json(&create_bot_body(draft))
    }

    fn update_strategy_request(&self, bot_id: &str, config: &StrategyConfig) -> RequestBuilder {
        self.request(Method::PUT, &format!("bots/{}/strategy", bot_id))
            .json(config)
    }

    fn get_bot_request(&self, bot_id: &str) -> RequestBuilder {
        self.request(Method::GET, &format!("bots/{}", bot_id))
    }

    fn list_bots_request(&self) -> RequestBuilder {
        self.request(Method::GET, "bots")
    }

    fn control_bot_request(&self, bot_id: &str, command: BotCommand) -> RequestBuilder {
        self.request(
            Method::POST,
            &format!("bots/{}/{}", bot_id, command.path_segment()),
        )
    }

    fn get_wallet_request(&self, wallet_id: &str) -> RequestBuilder {
        self.request(Method::GET, &format!("wallets/{}", wallet_id))
    }

    fn list_wallets_request(&self, user_id: &str) -> RequestBuilder {
        self.request(Method::GET, "wallets")
            .query(&[("userId", user_id)])
    }

    fn get_snapshots_request(&self, wallet_id: &str, from: DateTime<Utc>) -> RequestBuilder {
        let from = from.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.request(Method::GET, &format!("wallets/{}/snapshots", wallet_id))
            .query(&[("from", from.as_str())])
    }
}

#[async_trait]
impl BotApi for DashboardApi {
    async fn create_bot(&self, draft: &CreateBotDraft) -> std::result::Result<BotEntity, RemoteError> {
        self.send_json(self.create_bot_request(draft), "create bot").await
    }

    async fn update_strategy(
        &self,
        bot_id: &str,
        config: &StrategyConfig,
    ) -> std::result::Result<BotEntity, RemoteError> {
        let req = self.update_strategy_request(bot_id, config);
        self.send_json(req, "update bot strategy").await
    }

    async fn get_bot(&self, bot_id: &str) -> std::result::Result<BotEntity, RemoteError> {
        self.send_json(self.get_bot_request(bot_id), "load bot details").await
    }

    async fn list_bots(&self) -> std::result::Result<Vec<BotEntity>, RemoteError> {
        self.send_json(self.list_bots_request(), "load bots").await
    }

    async fn control_bot(&self, bot_id: &str, command: BotCommand) -> std::result::Result<(), RemoteError> {
        let action = format!("{} bot", command.path_segment());
        self.send(self.control_bot_request(bot_id, command), &action)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WalletApi for DashboardApi {
    async fn get_wallet(&self, wallet_id: &str) -> std::result::Result<WalletEntity, RemoteError> {
        self.send_json(self.get_wallet_request(wallet_id), "load wallet details")
            .await
    }

    async fn list_wallets(&self, user_id: &str) -> std::result::Result<Vec<WalletEntity>, RemoteError> {
        self.send_json(self.list_wallets_request(user_id), "load wallets")
            .await
    }

    async fn get_snapshots(
        &self,
        wallet_id: &str,
        from: DateTime<Utc>,
    ) -> std::result::Result<Vec<WalletSnapshot>, RemoteError> {
        let req = self.get_snapshots_request(wallet_id, from);
        self.send_json(req, "load wallet snapshots").await
    }
}
