use crate::error::{Error, Result};
use crate::schema::duplicate_risk_rule;
use crate::types::StrategyConfig;

pub fn serialize(config: &StrategyConfig) -> String {
    match serde_json::to_string_pretty(config) {
        Ok(text) => text,
        Err(e) => {
            // Only reachable if a Serialize impl is changed to fail.
            tracing::error!("Failed to serialize strategy config: {}", e);
            String::new()
        }
    }
}

pub fn parse(text: &str) -> Result<StrategyConfig> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::parse(e.to_string()))?;

    let config: StrategyConfig =
        serde_json::from_value(value).map_err(|e| Error::schema(e.to_string()))?;

    if let Some(kind) = duplicate_risk_rule(&config.risk_configs) {
        return Err(Error::schema(format!(
            "riskConfigs contains more than one {} rule",
            kind
        )));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorConfig, PeriodOptions, RiskRuleKind};

    fn sample() -> StrategyConfig {
        let mut config = StrategyConfig::default();
        config
            .indicator_configs
            .push(IndicatorConfig::Ema(PeriodOptions { period: 50 }));
        config.risk_configs.push(RiskRuleKind::InsufficientHoldings.default_config());
        config.order_strategy_config.fixed_buy_percentage = 0.1 + 0.2;
        config
    }

    #[test]
    fn test_round_trip() {
        let config = sample();
        let parsed = parse(&serialize(&config)).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_wire_shape() {
        let text = serialize(&StrategyConfig::default());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["indicatorConfigs"][0]["type"], "sma");
        assert_eq!(value["indicatorConfigs"][0]["options"]["period"], 14);
        assert_eq!(value["riskConfigs"][0]["type"], "insufficientCash");
        assert_eq!(value["riskConfigs"][0]["options"], serde_json::json!({}));
        assert_eq!(value["riskConfigs"][1]["options"]["maxTradeSizePct"], 0.05);
        assert_eq!(value["orderStrategyConfig"]["fixedBuyPercentage"], 0.2);
        assert!(text.contains("\n  \"indicatorConfigs\""));
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        let err = parse("{\"indicatorConfigs\": [").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_unknown_tag_is_schema_error() {
        let text = serialize(&StrategyConfig::default()).replace("\"sma\"", "\"macd\"");
        assert!(matches!(parse(&text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_missing_option_field_is_schema_error() {
        let text = r#"{
            "indicatorConfigs": [],
            "riskConfigs": [{ "type": "positionSizing", "options": { "perTradeRiskPct": 0.02 } }],
            "orderStrategyConfig": { "fixedBuyPercentage": 0.2, "sellProfitThreshold": 0.05 }
        }"#;
        assert!(matches!(parse(text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_negative_count_is_schema_error() {
        let text = r#"{
            "indicatorConfigs": [{ "type": "sma", "options": { "period": -3 } }],
            "riskConfigs": [],
            "orderStrategyConfig": { "fixedBuyPercentage": 0.2, "sellProfitThreshold": 0.05 }
        }"#;
        assert!(matches!(parse(text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_duplicate_risk_tag_is_schema_error() {
        let text = r#"{
            "indicatorConfigs": [],
            "riskConfigs": [
                { "type": "positionLimit", "options": { "maxPositionCount": 5 } },
                { "type": "positionLimit", "options": { "maxPositionCount": 9 } }
            ],
            "orderStrategyConfig": { "fixedBuyPercentage": 0.2, "sellProfitThreshold": 0.05 }
        }"#;
        assert!(matches!(parse(text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_out_of_range_value_still_parses() {
        // Range checks belong to validation, not parsing.
        let text = serialize(&StrategyConfig::default()).replace("0.2", "1.5");
        let config = parse(&text).unwrap();
        assert_eq!(config.order_strategy_config.fixed_buy_percentage, 1.5);
    }
}
