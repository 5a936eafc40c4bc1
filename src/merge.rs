use crate::error::{Error, Result};
use crate::types::{IndicatorConfig, IndicatorKind, OrderStrategyConfig, RiskRuleConfig, RiskRuleKind};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorPatch {
    pub period: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskRulePatch {
    pub max_trade_size_pct: Option<f64>,
    pub max_position_count: Option<u32>,
    pub per_trade_risk_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrderStrategyPatch {
    pub fixed_buy_percentage: Option<f64>,
    pub sell_profit_threshold: Option<f64>,
}

pub fn merge_risk_rule(configs: &mut Vec<RiskRuleConfig>, rule: RiskRuleConfig) {
    match configs.iter_mut().find(|existing| existing.kind() == rule.kind()) {
        Some(existing) => *existing = rule,
        None => configs.push(rule),
    }
}

pub fn remove_risk_rule(configs: &mut Vec<RiskRuleConfig>, kind: RiskRuleKind) {
    configs.retain(|rule| rule.kind() != kind);
}

/// Patches the options of the `kind` rule, adding it from its default first
/// when it isn't configured yet.
pub fn patch_risk_rule(configs: &mut Vec<RiskRuleConfig>, kind: RiskRuleKind, patch: RiskRulePatch) {
    let index = match configs.iter().position(|rule| rule.kind() == kind) {
        Some(index) => index,
        None => {
            configs.push(kind.default_config());
            configs.len() - 1
        }
    };

    match &mut configs[index] {
        RiskRuleConfig::InsufficientCash(_) | RiskRuleConfig::InsufficientHoldings(_) => {}
        RiskRuleConfig::MaxTradeSize(opts) => {
            if let Some(pct) = patch.max_trade_size_pct {
                opts.max_trade_size_pct = pct;
            }
        }
        RiskRuleConfig::PositionLimit(opts) => {
            if let Some(count) = patch.max_position_count {
                opts.max_position_count = count;
            }
        }
        RiskRuleConfig::PositionSizing(opts) => {
            if let Some(pct) = patch.per_trade_risk_pct {
                opts.per_trade_risk_pct = pct;
            }
            if let Some(pct) = patch.stop_loss_pct {
                opts.stop_loss_pct = pct;
            }
        }
    }
}

pub fn available_risk_rules(configs: &[RiskRuleConfig]) -> Vec<RiskRuleKind> {
    RiskRuleKind::ALL
        .into_iter()
        .filter(|kind| configs.iter().all(|rule| rule.kind() != *kind))
        .collect()
}

pub fn merge_indicator(
    configs: &mut [IndicatorConfig],
    index: usize,
    patch: IndicatorPatch,
) -> Result<()> {
    let len = configs.len();
    let indicator = configs.get_mut(index).ok_or(Error::Index { index, len })?;
    if let Some(period) = patch.period {
        indicator.options_mut().period = period;
    }
    Ok(())
}

pub fn add_indicator(configs: &mut Vec<IndicatorConfig>, kind: IndicatorKind) -> usize {
    configs.push(kind.default_config());
    configs.len() - 1
}

pub fn remove_indicator(configs: &mut Vec<IndicatorConfig>, index: usize) {
    if index < configs.len() {
        configs.remove(index);
    }
}

pub fn patch_order_strategy(config: &mut OrderStrategyConfig, patch: OrderStrategyPatch) {
    if let Some(pct) = patch.fixed_buy_percentage {
        config.fixed_buy_percentage = pct;
    }
    if let Some(pct) = patch.sell_profit_threshold {
        config.sell_profit_threshold = pct;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaxTradeSizeOptions, PeriodOptions, PositionLimitOptions};
    use std::collections::HashSet;

    fn max_trade(pct: f64) -> RiskRuleConfig {
        RiskRuleConfig::MaxTradeSize(MaxTradeSizeOptions { max_trade_size_pct: pct })
    }

    #[test]
    fn test_add_then_edit_replaces() {
        let mut rules = Vec::new();
        merge_risk_rule(&mut rules, max_trade(0.05));
        assert_eq!(rules, vec![max_trade(0.05)]);

        merge_risk_rule(&mut rules, max_trade(0.10));
        assert_eq!(rules, vec![max_trade(0.10)]);
    }

    #[test]
    fn test_merge_keeps_position() {
        let mut rules = vec![
            RiskRuleKind::InsufficientCash.default_config(),
            max_trade(0.05),
            RiskRuleKind::PositionLimit.default_config(),
        ];
        merge_risk_rule(&mut rules, max_trade(0.2));
        assert_eq!(rules[1], max_trade(0.2));
        assert_eq!(rules[0].kind(), RiskRuleKind::InsufficientCash);
        assert_eq!(rules[2].kind(), RiskRuleKind::PositionLimit);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = vec![RiskRuleKind::PositionSizing.default_config(), max_trade(0.05)];
        for rule in RiskRuleKind::ALL.map(RiskRuleKind::default_config) {
            let mut once = base.clone();
            merge_risk_rule(&mut once, rule.clone());
            let mut twice = once.clone();
            merge_risk_rule(&mut twice, rule);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_repeated_merges_keep_tags_unique() {
        let mut rules = Vec::new();
        for round in 0..3 {
            for kind in RiskRuleKind::ALL {
                merge_risk_rule(&mut rules, kind.default_config());
            }
            merge_risk_rule(&mut rules, max_trade(0.01 * (round + 1) as f64));
        }
        let tags: HashSet<_> = rules.iter().map(RiskRuleConfig::kind).collect();
        assert_eq!(tags.len(), rules.len());
        assert_eq!(rules.len(), RiskRuleKind::ALL.len());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut once = vec![max_trade(0.05), RiskRuleKind::PositionLimit.default_config()];
        remove_risk_rule(&mut once, RiskRuleKind::MaxTradeSize);
        let mut twice = once.clone();
        remove_risk_rule(&mut twice, RiskRuleKind::MaxTradeSize);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_patch_risk_rule_touches_one_field() {
        let mut rules = vec![
            max_trade(0.05),
            RiskRuleKind::PositionSizing.default_config(),
        ];
        patch_risk_rule(
            &mut rules,
            RiskRuleKind::PositionSizing,
            RiskRulePatch {
                stop_loss_pct: Some(0.1),
                max_trade_size_pct: Some(0.9),
                ..Default::default()
            },
        );
        assert_eq!(rules[0], max_trade(0.05));
        match &rules[1] {
            RiskRuleConfig::PositionSizing(opts) => {
                assert_eq!(opts.stop_loss_pct, 0.1);
                assert_eq!(opts.per_trade_risk_pct, 0.02);
            }
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_patch_missing_rule_backfills_default() {
        let mut rules = Vec::new();
        patch_risk_rule(
            &mut rules,
            RiskRuleKind::PositionLimit,
            RiskRulePatch {
                max_position_count: Some(8),
                ..Default::default()
            },
        );
        assert_eq!(
            rules,
            vec![RiskRuleConfig::PositionLimit(PositionLimitOptions { max_position_count: 8 })]
        );
    }

    #[test]
    fn test_available_rules() {
        let rules = vec![max_trade(0.05), RiskRuleKind::InsufficientCash.default_config()];
        assert_eq!(
            available_risk_rules(&rules),
            vec![
                RiskRuleKind::InsufficientHoldings,
                RiskRuleKind::PositionLimit,
                RiskRuleKind::PositionSizing,
            ]
        );
    }

    #[test]
    fn test_merge_indicator_keeps_siblings_and_type() {
        let mut indicators = vec![
            IndicatorKind::Sma.default_config(),
            IndicatorKind::Ema.default_config(),
            IndicatorKind::Sma.default_config(),
        ];
        merge_indicator(&mut indicators, 1, IndicatorPatch { period: Some(26) }).unwrap();
        assert_eq!(indicators[1], IndicatorConfig::Ema(PeriodOptions { period: 26 }));
        assert_eq!(indicators[0].period(), 14);
        assert_eq!(indicators[2].period(), 14);
    }

    #[test]
    fn test_merge_indicator_out_of_bounds() {
        let mut indicators = vec![IndicatorKind::Sma.default_config()];
        let err = merge_indicator(&mut indicators, 4, IndicatorPatch { period: Some(20) }).unwrap_err();
        assert_eq!(err, Error::Index { index: 4, len: 1 });
    }

    #[test]
    fn test_remove_indicator_idempotent() {
        let mut indicators = vec![
            IndicatorKind::Sma.default_config(),
            IndicatorKind::Ema.default_config(),
        ];
        remove_indicator(&mut indicators, 0);
        remove_indicator(&mut indicators, 5);
        assert_eq!(indicators, vec![IndicatorKind::Ema.default_config()]);
    }

    #[test]
    fn test_add_indicator_uses_default() {
        let mut indicators = Vec::new();
        let index = add_indicator(&mut indicators, IndicatorKind::Ema);
        assert_eq!(index, 0);
        assert_eq!(indicators[0].period(), 12);
    }
}
