use std::sync::Arc;

use thiserror::Error;

use crate::builder::{Mutation, plan_transaction};
use crate::config::PasteConfig;
use crate::convert::{ContentConverter, ConvertError, FileIntake};
use crate::core::{ApplyError, Editor};
use crate::payload::{ClipboardPayload, DataTransfer};
use crate::rules::{DROP_RULES, PASTE_RULES, PasteRule, Plan, RuleContext, RuleId, evaluate};

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("content conversion failed: {0}")]
    Convert(#[from] ConvertError),
    #[error("paste could not be applied: {0}")]
    Apply(#[from] ApplyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Paste,
    Drop,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Paste => "paste",
            Gesture::Drop => "drop",
        }
    }
}

/// Whether the pipeline consumed a gesture. Unhandled gestures belong to the host's default
/// behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub handled: bool,
    pub rule: Option<RuleId>,
    pub mutation: Mutation,
}

impl EditOutcome {
    pub fn unhandled() -> Self {
        Self {
            handled: false,
            rule: None,
            mutation: Mutation::NoOp,
        }
    }

    fn handled(rule: RuleId, mutation: Mutation) -> Self {
        Self {
            handled: true,
            rule: Some(rule),
            mutation,
        }
    }
}

pub struct PasteHandler {
    converters: Arc<dyn ContentConverter>,
    file_intake: Arc<dyn FileIntake>,
    config: PasteConfig,
}

impl PasteHandler {
    pub fn new(converters: Arc<dyn ContentConverter>, file_intake: Arc<dyn FileIntake>) -> Self {
        Self {
            converters,
            file_intake,
            config: PasteConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PasteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PasteConfig {
        &self.config
    }

    pub fn handle_paste(
        &self,
        editor: &mut Editor,
        event: &dyn DataTransfer,
    ) -> Result<EditOutcome, PasteError> {
        if !self.accepts(editor, Gesture::Paste) {
            return Ok(EditOutcome::unhandled());
        }
        let payload = ClipboardPayload::from_transfer(event);
        self.run(editor, &payload, Gesture::Paste, PASTE_RULES)
    }

    /// Same as [`Self::handle_paste`] for a payload the host already extracted.
    pub fn paste_payload(
        &self,
        editor: &mut Editor,
        payload: &ClipboardPayload,
    ) -> Result<EditOutcome, PasteError> {
        if !self.accepts(editor, Gesture::Paste) {
            return Ok(EditOutcome::unhandled());
        }
        self.run(editor, payload, Gesture::Paste, PASTE_RULES)
    }

    /// Drops only claim files; anything else is left to the host.
    pub fn handle_drop(
        &self,
        editor: &mut Editor,
        event: &dyn DataTransfer,
    ) -> Result<EditOutcome, PasteError> {
        if !self.accepts(editor, Gesture::Drop) {
            return Ok(EditOutcome::unhandled());
        }
        let payload = ClipboardPayload::from_transfer(event);
        self.run(editor, &payload, Gesture::Drop, DROP_RULES)
    }

    fn accepts(&self, editor: &Editor, gesture: Gesture) -> bool {
        if editor.is_editable() {
            return true;
        }
        tracing::debug!(gesture = gesture.as_str(), "editor is read-only, gesture ignored");
        false
    }

    fn run(
        &self,
        editor: &mut Editor,
        payload: &ClipboardPayload,
        gesture: Gesture,
        rules: &[PasteRule],
    ) -> Result<EditOutcome, PasteError> {
        tracing::debug!(
            gesture = gesture.as_str(),
            text_len = payload.plain_text.len(),
            html_len = payload.html.len(),
            has_node = payload.internal_node.is_some(),
            has_markdown = payload.markdown_text.is_some(),
            language = payload.code_language.as_deref().unwrap_or(""),
            files = payload.files.len(),
            "evaluating paste rules"
        );

        let (rule, tx, mutation) = {
            let ctx = RuleContext::new(editor, self.converters.as_ref(), &self.config);
            let Some((rule, plan)) = evaluate(rules, payload, &ctx)? else {
                return Ok(EditOutcome::unhandled());
            };

            if let Plan::IntakeFiles { files } = &plan {
                for file in files {
                    tracing::debug!(
                        name = %file.name,
                        mime = %file.mime_type,
                        bytes = file.len(),
                        "handing file to intake"
                    );
                    self.file_intake.intake(file);
                }
                return Ok(EditOutcome::handled(
                    rule,
                    Mutation::IntakeFiles { count: files.len() },
                ));
            }

            let (tx, mutation) = plan_transaction(&plan, &ctx)?;
            (rule, tx, mutation)
        };

        editor.apply(tx.source(format!("{}:{}", gesture.as_str(), rule)))?;
        Ok(EditOutcome::handled(rule, mutation))
    }
}
