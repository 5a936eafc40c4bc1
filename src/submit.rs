use crate::api::BotApi;
use crate::error::Result;
use crate::schema::Validate;
use crate::types::{BotEntity, CreateBotDraft, StrategyConfig};

pub struct BotSubmitter<A: BotApi> {
    api: A,
}

impl<A: BotApi> BotSubmitter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn submit(&self, draft: &CreateBotDraft, bot_id: Option<&str>) -> Result<BotEntity> {
        match bot_id {
            None => self.create(draft).await,
            Some(id) => self.update_strategy(id, &draft.strategy_config).await,
        }
    }

    pub async fn create(&self, draft: &CreateBotDraft) -> Result<BotEntity> {
        if let Err(e) = draft.validate() {
            tracing::warn!("Rejected bot draft '{}': {}", draft.name, e);
            return Err(e.into());
        }

        match self.api.create_bot(draft).await {
            Ok(bot) => {
                tracing::info!(
                    "Bot created: {} ({}) trading {}",
                    bot.name,
                    bot.id,
                    bot.market_pairs.join(", ")
                );
                Ok(bot)
            }
            Err(e) => {
                tracing::error!("Failed to create bot: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn update_strategy(&self, bot_id: &str, config: &StrategyConfig) -> Result<BotEntity> {
        if let Err(e) = config.validate() {
            tracing::warn!("Rejected strategy update for {}: {}", bot_id, e);
            return Err(e.into());
        }

        match self.api.update_strategy(bot_id, config).await {
            Ok(bot) => {
                tracing::info!(
                    "Strategy updated for {}: {} indicators, {} risk rules",
                    bot_id,
                    bot.strategy_config.indicator_configs.len(),
                    bot.strategy_config.risk_configs.len()
                );
                Ok(bot)
            }
            Err(e) => {
                tracing::error!("Failed to update bot strategy for {}: {}", bot_id, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBotApi;
    use crate::error::{Error, RemoteError, ValidationError};
    use crate::types::BotStatus;
    use chrono::Utc;

    fn bot_from(id: &str, draft: &CreateBotDraft) -> BotEntity {
        BotEntity {
            id: id.to_string(),
            name: draft.name.clone(),
            description: Some(draft.description.clone()),
            status: BotStatus::Stopped,
            market_pairs: draft.market_pairs.iter().cloned().collect(),
            strategy_config: draft.strategy_config.clone(),
            wallet_id: None,
            market_data_feed_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn valid_draft() -> CreateBotDraft {
        CreateBotDraft {
            name: "SOL momentum".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_draft_never_hits_network() {
        let mut api = MockBotApi::new();
        api.expect_create_bot().times(0);
        api.expect_update_strategy().times(0);

        let mut draft = valid_draft();
        draft.strategy_config.order_strategy_config.fixed_buy_percentage = 1.5;

        let submitter = BotSubmitter::new(api);
        let err = submitter.submit(&draft, None).await.unwrap_err();
        assert_eq!(err.field(), Some("fixedBuyPercentage"));

        let err = submitter.submit(&draft, Some("bot-1")).await.unwrap_err();
        assert_eq!(err.field(), Some("fixedBuyPercentage"));
    }

    #[tokio::test]
    async fn test_strategy_error_reported_before_basic_info() {
        let mut api = MockBotApi::new();
        api.expect_create_bot().times(0);

        let mut draft = CreateBotDraft::default();
        draft.strategy_config.order_strategy_config.fixed_buy_percentage = 1.5;

        let err = BotSubmitter::new(api).submit(&draft, None).await.unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::new(
                "fixedBuyPercentage",
                "1.5 is outside (0, 1]"
            ))
        );
    }

    #[tokio::test]
    async fn test_create_without_bot_id() {
        let mut api = MockBotApi::new();
        api.expect_create_bot()
            .withf(|draft| draft.name == "SOL momentum")
            .times(1)
            .returning(|draft| Ok(bot_from("bot-7", draft)));
        api.expect_update_strategy().times(0);

        let bot = BotSubmitter::new(api).submit(&valid_draft(), None).await.unwrap();
        assert_eq!(bot.id, "bot-7");
    }

    #[tokio::test]
    async fn test_update_with_bot_id() {
        let mut api = MockBotApi::new();
        api.expect_create_bot().times(0);
        api.expect_update_strategy()
            .withf(|id, _| id == "bot-3")
            .times(1)
            .returning(|id, config| {
                let mut bot = bot_from(id, &valid_draft());
                bot.strategy_config = config.clone();
                Ok(bot)
            });

        let bot = BotSubmitter::new(api)
            .submit(&valid_draft(), Some("bot-3"))
            .await
            .unwrap();
        assert_eq!(bot.id, "bot-3");
    }

    #[tokio::test]
    async fn test_update_ignores_draft_only_fields() {
        // Only the strategy is sent on update, so an empty name is fine.
        let mut api = MockBotApi::new();
        api.expect_update_strategy()
            .times(1)
            .returning(|id, _| Ok(bot_from(id, &valid_draft())));

        let draft = CreateBotDraft::default();
        assert!(BotSubmitter::new(api).submit(&draft, Some("bot-3")).await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_failure_surfaced_once() {
        let mut api = MockBotApi::new();
        api.expect_create_bot()
            .times(1)
            .returning(|_| Err(RemoteError::new(Some(409), "Bot name already taken")));

        let err = BotSubmitter::new(api).create(&valid_draft()).await.unwrap_err();
        assert_eq!(
            err,
            Error::Remote(RemoteError::new(Some(409), "Bot name already taken"))
        );
    }
}
