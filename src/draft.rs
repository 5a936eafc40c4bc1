use crate::api::BotApi;
use crate::error::{Error, Result, ValidationError};
use crate::schema::{
    from_percent, validate_basic_info, validate_indicators, validate_risk_rules, Validate,
    DEFAULT_INITIAL_CASH, DEFAULT_SOLANA_RPC_URL, DEFAULT_SYNC_INTERVAL_MS,
};
use crate::session::{SessionGuard, SessionToken};
use crate::submit::BotSubmitter;
use crate::types::{
    BotEntity, CreateBotDraft, HistoricalConfig, IndicatorConfig, InMemoryWalletOptions,
    MarketDataConfig, MaxTradeSizeOptions, PeriodOptions, PositionLimitOptions,
    PositionSizingOptions, RiskRuleConfig, RiskRuleKind, SolanaWalletOptions, StrategyConfig,
    WalletConfig, WalletKind,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

pub const MARKET_PAIRS: [&str; 10] = [
    "SOL/USDC",
    "TRUMP/USDC",
    "RENDER/USDC",
    "JUP/USDC",
    "BONK/USDC",
    "JTO/USDC",
    "MSOL/USDC",
    "PYTH/USDC",
    "BTC/USDC",
    "ETH/USDC",
];

impl Default for CreateBotDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            market_pairs: BTreeSet::from(["SOL/USDC".to_string()]),
            strategy_config: StrategyConfig::default(),
            wallet_config: WalletConfig::default(),
            market_data: MarketDataConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreateStep {
    BasicInfo,
    Indicators,
    Risk,
    OrderStrategy,
    Wallet,
    MarketData,
}

impl CreateStep {
    pub const ALL: [CreateStep; 6] = [
        CreateStep::BasicInfo,
        CreateStep::Indicators,
        CreateStep::Risk,
        CreateStep::OrderStrategy,
        CreateStep::Wallet,
        CreateStep::MarketData,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CreateStep::BasicInfo => "Basic Information",
            CreateStep::Indicators => "Indicator Configuration",
            CreateStep::Risk => "Risk Configuration",
            CreateStep::OrderStrategy => "Order Strategy",
            CreateStep::Wallet => "Wallet Configuration",
            CreateStep::MarketData => "Market Data Configuration",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<CreateStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<CreateStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    pub fn validate(&self, draft: &CreateBotDraft) -> std::result::Result<(), ValidationError> {
        let strategy = &draft.strategy_config;
        match self {
            CreateStep::BasicInfo => validate_basic_info(&draft.name, &draft.market_pairs),
            CreateStep::Indicators => validate_indicators(&strategy.indicator_configs),
            CreateStep::Risk => validate_risk_rules(&strategy.risk_configs),
            CreateStep::OrderStrategy => strategy.order_strategy_config.validate(),
            CreateStep::Wallet => draft.wallet_config.validate(),
            CreateStep::MarketData => draft.market_data.validate(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn per_trade_risk_pct(self) -> f64 {
        match self {
            RiskLevel::Low => 0.01,
            RiskLevel::Medium => 0.02,
            RiskLevel::High => 0.03,
        }
    }

    fn max_trade_size_pct(self) -> f64 {
        match self {
            RiskLevel::Low => 0.03,
            RiskLevel::Medium => 0.05,
            RiskLevel::High => 0.1,
        }
    }
}

/// Standard rule set for a risk appetite. `stop_loss_percent` is on the 0-100
/// scale; `max_trade_size_pct` overrides the level's trade size fraction.
pub fn risk_configs_for_level(
    level: RiskLevel,
    stop_loss_percent: f64,
    max_open_trades: u32,
    max_trade_size_pct: Option<f64>,
) -> Vec<RiskRuleConfig> {
    vec![
        RiskRuleKind::InsufficientCash.default_config(),
        RiskRuleConfig::MaxTradeSize(MaxTradeSizeOptions {
            max_trade_size_pct: max_trade_size_pct.unwrap_or_else(|| level.max_trade_size_pct()),
        }),
        RiskRuleConfig::PositionSizing(PositionSizingOptions {
            per_trade_risk_pct: level.per_trade_risk_pct(),
            stop_loss_pct: from_percent(stop_loss_percent),
        }),
        RiskRuleConfig::PositionLimit(PositionLimitOptions {
            max_position_count: max_open_trades,
        }),
    ]
}

pub fn indicator_configs_for_strategy(strategy: &str) -> Vec<IndicatorConfig> {
    let period = match strategy {
        "sma" => 14,
        "macd" => 12,
        _ => 21,
    };
    vec![IndicatorConfig::Sma(PeriodOptions { period })]
}

#[derive(Debug, Clone, Default)]
pub struct WalletOptions {
    pub initial_cash: Option<f64>,
    pub private_key: Option<String>,
    pub rpc_url: Option<String>,
    pub sync_interval_ms: Option<u64>,
}

pub fn wallet_config(kind: WalletKind, options: WalletOptions) -> WalletConfig {
    match kind {
        WalletKind::InMemory => WalletConfig::InMemory(InMemoryWalletOptions {
            initial_cash: options
                .initial_cash
                .filter(|cash| *cash > 0.0)
                .unwrap_or(DEFAULT_INITIAL_CASH),
        }),
        WalletKind::SolanaWallet => WalletConfig::SolanaWallet(SolanaWalletOptions {
            private_key: options.private_key.unwrap_or_default(),
            rpc_url: options
                .rpc_url
                .unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string()),
            sync_interval_ms: options
                .sync_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_SYNC_INTERVAL_MS),
        }),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketDataOptions {
    pub market_data_feed_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub speed_multiplier: Option<f64>,
}

pub fn market_data_config(
    use_real_data: bool,
    options: Option<MarketDataOptions>,
    now: DateTime<Utc>,
) -> MarketDataConfig {
    let options = options.unwrap_or_default();

    let historical_config = (!use_real_data).then(|| {
        let end_date = options.end_date.unwrap_or(now);
        HistoricalConfig {
            start_date: options.start_date.unwrap_or(end_date - Duration::days(1)),
            end_date,
            speed_multiplier: options.speed_multiplier.unwrap_or(1.0),
        }
    });

    MarketDataConfig {
        use_real_data,
        market_data_feed_id: options.market_data_feed_id,
        historical_config,
    }
}

// ---------------------------------------------------------------------------
// Wizard session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PendingCreate {
    token: SessionToken,
    draft: CreateBotDraft,
}

impl PendingCreate {
    pub fn draft(&self) -> &CreateBotDraft {
        &self.draft
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(BotEntity),
    Stale,
}

pub struct CreateBotSession {
    draft: CreateBotDraft,
    step: CreateStep,
    last_error: Option<Error>,
    sessions: SessionGuard,
}

impl Default for CreateBotSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateBotSession {
    pub fn new() -> Self {
        let mut sessions = SessionGuard::new();
        sessions.begin();
        Self {
            draft: CreateBotDraft::default(),
            step: CreateStep::BasicInfo,
            last_error: None,
            sessions,
        }
    }

    pub fn draft(&self) -> &CreateBotDraft {
        &self.draft
    }

    pub fn step(&self) -> CreateStep {
        self.step
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.sessions.current().is_some()
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut CreateBotDraft)) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(Error::state("bot creation was closed")));
        }
        f(&mut self.draft);
        self.last_error = None;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.edit(|draft| draft.name = name)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        self.edit(|draft| draft.description = description)
    }

    pub fn toggle_market_pair(&mut self, pair: &str) -> Result<()> {
        self.edit(|draft| {
            if !draft.market_pairs.remove(pair) {
                draft.market_pairs.insert(pair.to_string());
            }
        })
    }

    pub fn set_wallet_kind(&mut self, kind: WalletKind) -> Result<()> {
        self.edit(|draft| {
            if draft.wallet_config.kind() != kind {
                draft.wallet_config = kind.default_config();
            }
        })
    }

    /// Turning live data off attaches a default replay window if none is set.
    /// Turning it on keeps any existing window untouched.
    pub fn set_use_real_data(&mut self, use_real_data: bool, now: DateTime<Utc>) -> Result<()> {
        self.edit(|draft| {
            draft.market_data.use_real_data = use_real_data;
            if !use_real_data && draft.market_data.historical_config.is_none() {
                draft.market_data.historical_config =
                    market_data_config(false, None, now).historical_config;
            }
        })
    }

    pub fn next(&mut self) -> Result<CreateStep> {
        if let Err(e) = self.step.validate(&self.draft) {
            return Err(self.fail(e.into()));
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                self.last_error = None;
                Ok(step)
            }
            None => Err(self.fail(Error::state("already at the last step"))),
        }
    }

    pub fn back(&mut self) -> CreateStep {
        if let Some(step) = self.step.previous() {
            self.step = step;
        }
        self.step
    }

    pub fn begin_submit(&mut self) -> Result<PendingCreate> {
        let token = match self.sessions.current() {
            Some(token) => token,
            None => return Err(self.fail(Error::state("bot creation was closed"))),
        };
        if !self.step.is_last() {
            return Err(self.fail(Error::state("finish every step before creating the bot")));
        }
        if let Err(e) = self.draft.validate() {
            return Err(self.fail(e.into()));
        }

        self.last_error = None;
        Ok(PendingCreate {
            token,
            draft: self.draft.clone(),
        })
    }

    pub fn complete_submit(
        &mut self,
        pending: PendingCreate,
        result: Result<BotEntity>,
    ) -> Result<CreateOutcome> {
        if !self.sessions.is_active(pending.token) {
            tracing::warn!(
                "Dropping late create result for '{}': session no longer active",
                pending.draft.name
            );
            return Ok(CreateOutcome::Stale);
        }

        match result {
            Ok(bot) => {
                self.sessions.end();
                self.draft = CreateBotDraft::default();
                self.step = CreateStep::BasicInfo;
                self.last_error = None;
                tracing::info!("Bot '{}' created, draft discarded", bot.name);
                Ok(CreateOutcome::Created(bot))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn submit<A: BotApi>(&mut self, submitter: &BotSubmitter<A>) -> Result<CreateOutcome> {
        let pending = self.begin_submit()?;
        let result = submitter.create(pending.draft()).await;
        self.complete_submit(pending, result)
    }

    pub fn cancel(&mut self) {
        self.sessions.end();
        self.draft = CreateBotDraft::default();
        self.step = CreateStep::BasicInfo;
        self.last_error = None;
    }

    pub fn restart(&mut self) {
        self.cancel();
        self.sessions.begin();
    }

    fn fail(&mut self, err: Error) -> Error {
        tracing::warn!("Bot creation step rejected: {}", err);
        self.last_error = Some(err.clone());
        err
    }
}
