use crate::api::BotApi;
use crate::codec;
use crate::error::{Error, Result};
use crate::merge::{self, IndicatorPatch, OrderStrategyPatch, RiskRulePatch};
use crate::schema::Validate;
use crate::session::{SessionGuard, SessionToken};
use crate::submit::BotSubmitter;
use crate::types::{BotEntity, IndicatorKind, RiskRuleConfig, RiskRuleKind, StrategyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Viewing,
    EditingForm,
    EditingText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Form,
    Text,
}

impl EditMode {
    fn state(self) -> EditorState {
        match self {
            EditMode::Form => EditorState::EditingForm,
            EditMode::Text => EditorState::EditingText,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingSave {
    token: SessionToken,
    bot_id: String,
    config: StrategyConfig,
}

impl PendingSave {
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Committed(BotEntity),
    Stale,
}

pub struct StrategyEditor {
    bot_id: String,
    /// Last config confirmed by the service; doubles as the rollback snapshot.
    committed: StrategyConfig,
    working: StrategyConfig,
    text: String,
    state: EditorState,
    last_error: Option<Error>,
    sessions: SessionGuard,
}

impl StrategyEditor {
    pub fn new(bot_id: impl Into<String>, config: StrategyConfig) -> Self {
        let text = codec::serialize(&config);
        Self {
            bot_id: bot_id.into(),
            working: config.clone(),
            committed: config,
            text,
            state: EditorState::Viewing,
            last_error: None,
            sessions: SessionGuard::new(),
        }
    }

    pub fn for_bot(bot: &BotEntity) -> Self {
        Self::new(bot.id.clone(), bot.strategy_config.clone())
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state != EditorState::Viewing
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.working
    }

    pub fn committed(&self) -> &StrategyConfig {
        &self.committed
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn sync_from_bot(&mut self, bot: &BotEntity) {
        if self.is_editing() {
            tracing::warn!("Ignoring refresh of bot {} while its strategy is being edited", bot.id);
            return;
        }
        // The session guard is kept so tokens from earlier sessions stay stale.
        self.bot_id = bot.id.clone();
        self.committed = bot.strategy_config.clone();
        self.working = self.committed.clone();
        self.text = codec::serialize(&self.committed);
        self.last_error = None;
    }

    pub fn begin_edit(&mut self, mode: EditMode) -> Result<()> {
        if self.is_editing() {
            return Err(self.fail(Error::state("already editing")));
        }

        self.working = self.committed.clone();
        self.text = codec::serialize(&self.committed);
        self.last_error = None;
        self.sessions.begin();
        self.state = mode.state();
        tracing::debug!("Editing strategy of {} in {:?} mode", self.bot_id, mode);
        Ok(())
    }

    /// Switches between form and text while editing.
    ///
    /// Text to form is rejected on malformed or mis-shaped text; the editor
    /// then stays in text mode with the buffer and structured value untouched.
    pub fn switch_mode(&mut self, mode: EditMode) -> Result<()> {
        match (self.state, mode) {
            (EditorState::Viewing, _) => Err(self.fail(Error::state("not editing"))),
            (EditorState::EditingForm, EditMode::Form) | (EditorState::EditingText, EditMode::Text) => {
                Ok(())
            }
            (EditorState::EditingForm, EditMode::Text) => {
                self.text = codec::serialize(&self.working);
                self.state = EditorState::EditingText;
                self.last_error = None;
                Ok(())
            }
            (EditorState::EditingText, EditMode::Form) => {
                let parsed = codec::parse(&self.text).map_err(|e| self.fail(e))?;
                self.working = parsed;
                self.state = EditorState::EditingForm;
                self.last_error = None;
                Ok(())
            }
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        if self.state != EditorState::EditingText {
            return Err(self.fail(Error::state("text edits require text mode")));
        }
        self.text = text.into();
        self.last_error = None;
        Ok(())
    }

    fn form_edit<T>(
        &mut self,
        f: impl FnOnce(&mut StrategyConfig) -> Result<T>,
    ) -> Result<T> {
        if self.state != EditorState::EditingForm {
            return Err(self.fail(Error::state("form edits require form mode")));
        }
        match f(&mut self.working) {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn add_indicator(&mut self, kind: IndicatorKind) -> Result<usize> {
        self.form_edit(|config| Ok(merge::add_indicator(&mut config.indicator_configs, kind)))
    }

    pub fn patch_indicator(&mut self, index: usize, patch: IndicatorPatch) -> Result<()> {
        self.form_edit(|config| merge::merge_indicator(&mut config.indicator_configs, index, patch))
    }

    pub fn remove_indicator(&mut self, index: usize) -> Result<()> {
        self.form_edit(|config| {
            merge::remove_indicator(&mut config.indicator_configs, index);
            Ok(())
        })
    }

    pub fn add_risk_rule(&mut self, kind: RiskRuleKind) -> Result<()> {
        self.form_edit(|config| {
            if config.risk_configs.iter().all(|rule| rule.kind() != kind) {
                merge::merge_risk_rule(&mut config.risk_configs, kind.default_config());
            }
            Ok(())
        })
    }

    pub fn upsert_risk_rule(&mut self, rule: RiskRuleConfig) -> Result<()> {
        self.form_edit(|config| {
            merge::merge_risk_rule(&mut config.risk_configs, rule);
            Ok(())
        })
    }

    pub fn patch_risk_rule(&mut self, kind: RiskRuleKind, patch: RiskRulePatch) -> Result<()> {
        self.form_edit(|config| {
            merge::patch_risk_rule(&mut config.risk_configs, kind, patch);
            Ok(())
        })
    }

    pub fn remove_risk_rule(&mut self, kind: RiskRuleKind) -> Result<()> {
        self.form_edit(|config| {
            merge::remove_risk_rule(&mut config.risk_configs, kind);
            Ok(())
        })
    }

    pub fn patch_order_strategy(&mut self, patch: OrderStrategyPatch) -> Result<()> {
        self.form_edit(|config| {
            merge::patch_order_strategy(&mut config.order_strategy_config, patch);
            Ok(())
        })
    }

    pub fn cancel(&mut self) {
        if !self.is_editing() {
            return;
        }
        self.working = self.committed.clone();
        self.text = codec::serialize(&self.committed);
        self.last_error = None;
        self.sessions.end();
        self.state = EditorState::Viewing;
        tracing::debug!("Discarded strategy edits for {}", self.bot_id);
    }

    pub fn begin_save(&mut self) -> Result<PendingSave> {
        let token = match (self.is_editing(), self.sessions.current()) {
            (true, Some(token)) => token,
            _ => return Err(self.fail(Error::state("nothing to save"))),
        };

        if self.state == EditorState::EditingText {
            let parsed = codec::parse(&self.text).map_err(|e| self.fail(e))?;
            self.working = parsed;
        }

        if let Err(e) = self.working.validate() {
            return Err(self.fail(e.into()));
        }

        self.last_error = None;
        Ok(PendingSave {
            token,
            bot_id: self.bot_id.clone(),
            config: self.working.clone(),
        })
    }

    /// Second half of a save: applies the service's answer if the session
    /// that started the save is still the active one.
    pub fn complete_save(
        &mut self,
        pending: PendingSave,
        result: Result<BotEntity>,
    ) -> Result<SaveOutcome> {
        if !self.sessions.is_active(pending.token) {
            tracing::warn!(
                "Dropping late strategy save result for {}: session no longer active",
                pending.bot_id
            );
            return Ok(SaveOutcome::Stale);
        }

        match result {
            Ok(bot) => {
                self.committed = bot.strategy_config.clone();
                self.working = self.committed.clone();
                self.text = codec::serialize(&self.committed);
                self.last_error = None;
                self.sessions.end();
                self.state = EditorState::Viewing;
                tracing::info!("Trading strategy updated for {}", self.bot_id);
                Ok(SaveOutcome::Committed(bot))
            }
            // Edits stay in place for another attempt.
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn save<A: BotApi>(&mut self, submitter: &BotSubmitter<A>) -> Result<SaveOutcome> {
        let pending = self.begin_save()?;
        let result = submitter
            .update_strategy(pending.bot_id(), pending.config())
            .await;
        self.complete_save(pending, result)
    }

    fn fail(&mut self, err: Error) -> Error {
        if err.is_user_visible() {
            tracing::warn!("Strategy edit rejected: {}", err);
        } else {
            tracing::debug!("Strategy edit rejected: {}", err);
        }
        self.last_error = Some(err.clone());
        err
    }
}
