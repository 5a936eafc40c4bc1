use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            access_token: None,
            request_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            wallet_cache_ttl_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub request_timeout_ms: u64,

    // Idempotent reads only
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,

    pub wallet_cache_ttl_ms: u64,
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    pub indicator_configs: Vec<IndicatorConfig>,
    pub risk_configs: Vec<RiskRuleConfig>,
    pub order_strategy_config: OrderStrategyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorKind {
    Sma,
    Ema,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 2] = [IndicatorKind::Sma, IndicatorKind::Ema];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "camelCase")]
pub enum IndicatorConfig {
    Sma(PeriodOptions),
    Ema(PeriodOptions),
}

impl IndicatorConfig {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorConfig::Sma(_) => IndicatorKind::Sma,
            IndicatorConfig::Ema(_) => IndicatorKind::Ema,
        }
    }

    pub fn options(&self) -> &PeriodOptions {
        match self {
            IndicatorConfig::Sma(opts) | IndicatorConfig::Ema(opts) => opts,
        }
    }

    pub fn options_mut(&mut self) -> &mut PeriodOptions {
        match self {
            IndicatorConfig::Sma(opts) | IndicatorConfig::Ema(opts) => opts,
        }
    }

    pub fn period(&self) -> u32 {
        self.options().period
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PeriodOptions {
    pub period: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskRuleKind {
    InsufficientCash,
    InsufficientHoldings,
    MaxTradeSize,
    PositionLimit,
    PositionSizing,
}

impl RiskRuleKind {
    pub const ALL: [RiskRuleKind; 5] = [
        RiskRuleKind::InsufficientCash,
        RiskRuleKind::InsufficientHoldings,
        RiskRuleKind::MaxTradeSize,
        RiskRuleKind::PositionLimit,
        RiskRuleKind::PositionSizing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRuleKind::InsufficientCash => "insufficientCash",
            RiskRuleKind::InsufficientHoldings => "insufficientHoldings",
            RiskRuleKind::MaxTradeSize => "maxTradeSize",
            RiskRuleKind::PositionLimit => "positionLimit",
            RiskRuleKind::PositionSizing => "positionSizing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskRuleKind::InsufficientCash => "Insufficient Cash",
            RiskRuleKind::InsufficientHoldings => "Insufficient Holdings",
            RiskRuleKind::MaxTradeSize => "Maximum Trade Size",
            RiskRuleKind::PositionLimit => "Position Limit",
            RiskRuleKind::PositionSizing => "Position Sizing",
        }
    }
}

impl fmt::Display for RiskRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "camelCase")]
pub enum RiskRuleConfig {
    InsufficientCash(NoOptions),
    InsufficientHoldings(NoOptions),
    MaxTradeSize(MaxTradeSizeOptions),
    PositionLimit(PositionLimitOptions),
    PositionSizing(PositionSizingOptions),
}

impl RiskRuleConfig {
    pub fn kind(&self) -> RiskRuleKind {
        match self {
            RiskRuleConfig::InsufficientCash(_) => RiskRuleKind::InsufficientCash,
            RiskRuleConfig::InsufficientHoldings(_) => RiskRuleKind::InsufficientHoldings,
            RiskRuleConfig::MaxTradeSize(_) => RiskRuleKind::MaxTradeSize,
            RiskRuleConfig::PositionLimit(_) => RiskRuleKind::PositionLimit,
            RiskRuleConfig::PositionSizing(_) => RiskRuleKind::PositionSizing,
        }
    }
}

/// Options of a rule whose presence is the whole rule. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaxTradeSizeOptions {
    pub max_trade_size_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PositionLimitOptions {
    pub max_position_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PositionSizingOptions {
    pub per_trade_risk_pct: f64,
    pub stop_loss_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderStrategyConfig {
    pub fixed_buy_percentage: f64,
    pub sell_profit_threshold: f64,
}

// ---------------------------------------------------------------------------
// Wallet / market data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletKind {
    InMemory,
    SolanaWallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "kebab-case")]
pub enum WalletConfig {
    InMemory(InMemoryWalletOptions),
    SolanaWallet(SolanaWalletOptions),
}

impl WalletConfig {
    pub fn kind(&self) -> WalletKind {
        match self {
            WalletConfig::InMemory(_) => WalletKind::InMemory,
            WalletConfig::SolanaWallet(_) => WalletKind::SolanaWallet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InMemoryWalletOptions {
    pub initial_cash: f64,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SolanaWalletOptions {
    pub private_key: String,
    pub rpc_url: String,
    pub sync_interval_ms: u64,
}

impl fmt::Debug for SolanaWalletOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaWalletOptions")
            .field("private_key", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .field("sync_interval_ms", &self.sync_interval_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataConfig {
    pub use_real_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_data_feed_id: Option<String>,
    /// Kept even when `use_real_data` is set; see [`MarketDataConfig::replay`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_config: Option<HistoricalConfig>,
}

impl MarketDataConfig {
    pub fn replay(&self) -> Option<&HistoricalConfig> {
        if self.use_real_data {
            None
        } else {
            self.historical_config.as_ref()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalConfig {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,
}

fn default_speed_multiplier() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBotDraft {
    pub name: String,
    pub description: String,
    pub market_pairs: BTreeSet<String>,
    pub strategy_config: StrategyConfig,
    pub wallet_config: WalletConfig,
    pub market_data: MarketDataConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Active,
    Paused,
    Stopped,
    Error,
}

impl BotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BotStatus::Active => "Active",
            BotStatus::Paused => "Paused",
            BotStatus::Stopped => "Stopped",
            BotStatus::Error => "Error",
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotEntity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: BotStatus,
    pub market_pairs: Vec<String>,
    pub strategy_config: StrategyConfig,
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub market_data_feed_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl BotCommand {
    pub fn path_segment(&self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Pause => "pause",
            BotCommand::Resume => "resume",
            BotCommand::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEntity {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
    #[serde(default)]
    pub cash_balance: f64,
}
