pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod logging;
pub mod merge;
pub mod schema;
pub mod session;
pub mod submit;
pub mod types;
pub mod wallet;

pub use error::{Error, RemoteError, Result, ValidationError};
pub use schema::Validate;
pub use types::{
    BotEntity, CreateBotDraft, IndicatorConfig, MarketDataConfig, OrderStrategyConfig,
    RiskRuleConfig, StrategyConfig, WalletConfig,
};
