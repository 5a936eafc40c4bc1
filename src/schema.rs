use crate::error::ValidationError;
use crate::types::{
    CreateBotDraft, HistoricalConfig, IndicatorConfig, IndicatorKind, InMemoryWalletOptions,
    MarketDataConfig, MaxTradeSizeOptions, NoOptions, OrderStrategyConfig, PeriodOptions,
    PositionLimitOptions, PositionSizingOptions, RiskRuleConfig, RiskRuleKind,
    SolanaWalletOptions, StrategyConfig, WalletConfig, WalletKind,
};
use reqwest::Url;
use std::collections::HashSet;

pub const MIN_PERIOD: u32 = 2;
pub const MAX_PERIOD: u32 = 200;

pub const DEFAULT_SMA_PERIOD: u32 = 14;
pub const DEFAULT_EMA_PERIOD: u32 = 12;
pub const DEFAULT_MAX_TRADE_SIZE_PCT: f64 = 0.05;
pub const DEFAULT_MAX_POSITION_COUNT: u32 = 5;
pub const DEFAULT_PER_TRADE_RISK_PCT: f64 = 0.02;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.03;
pub const DEFAULT_FIXED_BUY_PERCENTAGE: f64 = 0.2;
pub const DEFAULT_SELL_PROFIT_THRESHOLD: f64 = 0.05;
pub const DEFAULT_INITIAL_CASH: f64 = 1000.0;
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 60_000;

impl IndicatorKind {
    pub fn default_config(self) -> IndicatorConfig {
        match self {
            IndicatorKind::Sma => IndicatorConfig::Sma(PeriodOptions {
                period: DEFAULT_SMA_PERIOD,
            }),
            IndicatorKind::Ema => IndicatorConfig::Ema(PeriodOptions {
                period: DEFAULT_EMA_PERIOD,
            }),
        }
    }
}

impl RiskRuleKind {
    pub fn default_config(self) -> RiskRuleConfig {
        match self {
            RiskRuleKind::InsufficientCash => RiskRuleConfig::InsufficientCash(NoOptions {}),
            RiskRuleKind::InsufficientHoldings => {
                RiskRuleConfig::InsufficientHoldings(NoOptions {})
            }
            RiskRuleKind::MaxTradeSize => RiskRuleConfig::MaxTradeSize(MaxTradeSizeOptions {
                max_trade_size_pct: DEFAULT_MAX_TRADE_SIZE_PCT,
            }),
            RiskRuleKind::PositionLimit => RiskRuleConfig::PositionLimit(PositionLimitOptions {
                max_position_count: DEFAULT_MAX_POSITION_COUNT,
            }),
            RiskRuleKind::PositionSizing => {
                RiskRuleConfig::PositionSizing(PositionSizingOptions {
                    per_trade_risk_pct: DEFAULT_PER_TRADE_RISK_PCT,
                    stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
                })
            }
        }
    }
}

impl WalletKind {
    /// Solana wallets start without a key; the draft is incomplete until one is set.
    pub fn default_config(self) -> WalletConfig {
        match self {
            WalletKind::InMemory => WalletConfig::InMemory(InMemoryWalletOptions {
                initial_cash: DEFAULT_INITIAL_CASH,
            }),
            WalletKind::SolanaWallet => WalletConfig::SolanaWallet(SolanaWalletOptions {
                private_key: String::new(),
                rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
                sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            }),
        }
    }
}

impl Default for OrderStrategyConfig {
    fn default() -> Self {
        Self {
            fixed_buy_percentage: DEFAULT_FIXED_BUY_PERCENTAGE,
            sell_profit_threshold: DEFAULT_SELL_PROFIT_THRESHOLD,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            indicator_configs: vec![IndicatorKind::Sma.default_config()],
            risk_configs: vec![
                RiskRuleKind::InsufficientCash.default_config(),
                RiskRuleKind::MaxTradeSize.default_config(),
                RiskRuleKind::PositionSizing.default_config(),
                RiskRuleKind::PositionLimit.default_config(),
            ],
            order_strategy_config: OrderStrategyConfig::default(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletKind::InMemory.default_config()
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            use_real_data: true,
            market_data_feed_id: None,
            historical_config: None,
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;

    fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(ValidationError::new(
            field,
            format!("{} is outside (0, 1]", value),
        ));
    }
    Ok(())
}

fn check_positive_count<T>(field: &str, value: T) -> Result<(), ValidationError>
where
    T: Into<u64> + Copy,
{
    if value.into() == 0 {
        return Err(ValidationError::new(field, "must be a positive integer"));
    }
    Ok(())
}

fn check_positive_amount(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(
            field,
            format!("{} must be a positive number", value),
        ));
    }
    Ok(())
}

impl Validate for IndicatorConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let period = self.period();
        if !(MIN_PERIOD..=MAX_PERIOD).contains(&period) {
            return Err(ValidationError::new(
                "period",
                format!(
                    "{} period {} is outside {}..={}",
                    self.kind(),
                    period,
                    MIN_PERIOD,
                    MAX_PERIOD
                ),
            ));
        }
        Ok(())
    }
}

impl Validate for RiskRuleConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            RiskRuleConfig::InsufficientCash(_) | RiskRuleConfig::InsufficientHoldings(_) => Ok(()),
            RiskRuleConfig::MaxTradeSize(opts) => {
                check_fraction("maxTradeSizePct", opts.max_trade_size_pct)
            }
            RiskRuleConfig::PositionLimit(opts) => {
                check_positive_count("maxPositionCount", opts.max_position_count)
            }
            RiskRuleConfig::PositionSizing(opts) => {
                check_fraction("perTradeRiskPct", opts.per_trade_risk_pct)?;
                check_fraction("stopLossPct", opts.stop_loss_pct)
            }
        }
    }
}

impl Validate for OrderStrategyConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        check_fraction("fixedBuyPercentage", self.fixed_buy_percentage)?;
        check_fraction("sellProfitThreshold", self.sell_profit_threshold)
    }
}

pub fn duplicate_risk_rule(configs: &[RiskRuleConfig]) -> Option<RiskRuleKind> {
    let mut seen = HashSet::new();
    configs
        .iter()
        .map(RiskRuleConfig::kind)
        .find(|kind| !seen.insert(*kind))
}

pub fn validate_indicators(indicators: &[IndicatorConfig]) -> Result<(), ValidationError> {
    indicators.iter().try_for_each(Validate::validate)
}

pub fn validate_risk_rules(rules: &[RiskRuleConfig]) -> Result<(), ValidationError> {
    if let Some(kind) = duplicate_risk_rule(rules) {
        return Err(ValidationError::new(
            "riskConfigs",
            format!("duplicate {} rule", kind),
        ));
    }
    rules.iter().try_for_each(Validate::validate)
}

impl Validate for StrategyConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_indicators(&self.indicator_configs)?;
        validate_risk_rules(&self.risk_configs)?;
        self.order_strategy_config.validate()
    }
}

impl Validate for WalletConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            WalletConfig::InMemory(opts) => check_positive_amount("initialCash", opts.initial_cash),
            WalletConfig::SolanaWallet(opts) => {
                if opts.private_key.trim().is_empty() {
                    return Err(ValidationError::new("privateKey", "is required"));
                }
                let url = Url::parse(&opts.rpc_url).map_err(|e| {
                    ValidationError::new("rpcUrl", format!("'{}' is not a URL: {}", opts.rpc_url, e))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ValidationError::new(
                        "rpcUrl",
                        format!("unsupported scheme '{}'", url.scheme()),
                    ));
                }
                check_positive_count("syncIntervalMs", opts.sync_interval_ms)
            }
        }
    }
}

impl Validate for HistoricalConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.end_date <= self.start_date {
            return Err(ValidationError::new("endDate", "must be after startDate"));
        }
        check_positive_amount("speedMultiplier", self.speed_multiplier)
    }
}

impl Validate for MarketDataConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(feed_id) = &self.market_data_feed_id {
            if feed_id.trim().is_empty() {
                return Err(ValidationError::new("marketDataFeedId", "must not be blank"));
            }
        }
        // A stale historical block is ignored while live data is on.
        if self.use_real_data {
            return Ok(());
        }
        match &self.historical_config {
            Some(historical) => historical.validate(),
            None => Err(ValidationError::new(
                "historicalConfig",
                "is required when useRealData is false",
            )),
        }
    }
}

pub fn validate_market_pair(symbol: &str) -> Result<(), ValidationError> {
    let valid_part =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    match symbol.split_once('/') {
        Some((base, quote)) if valid_part(base) && valid_part(quote) => Ok(()),
        _ => Err(ValidationError::new(
            "marketPairs",
            format!("'{}' is not a BASE/QUOTE symbol", symbol),
        )),
    }
}

pub fn validate_basic_info<'a>(
    name: &str,
    market_pairs: impl IntoIterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "is required"));
    }
    let mut count = 0;
    for pair in market_pairs {
        validate_market_pair(pair)?;
        count += 1;
    }
    if count == 0 {
        return Err(ValidationError::new("marketPairs", "select at least one pair"));
    }
    Ok(())
}

// Strategy errors are reported ahead of name and pair errors.
impl Validate for CreateBotDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        self.strategy_config.validate()?;
        validate_basic_info(&self.name, &self.market_pairs)?;
        self.wallet_config.validate()?;
        self.market_data.validate()
    }
}

pub fn to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

pub fn from_percent(percent: f64) -> f64 {
    percent / 100.0
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", to_percent(fraction))
}
