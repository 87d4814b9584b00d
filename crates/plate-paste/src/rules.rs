//! The paste decision table.
//!
//! Each rule looks at the payload and the editing context and either claims the gesture with a
//! [`Plan`] or passes. Rules run in table order and the first claim wins; nothing after it runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PasteConfig;
use crate::convert::ContentConverter;
use crate::core::{Document, Editor, Fragment, Node};
use crate::handler::PasteError;
use crate::payload::{ClipboardPayload, PastedFile};
use crate::position::Selection;
use crate::predicates::{
    TitleContext, caret_inside_code_block, is_valid_url, looks_like_markdown,
    normalize_line_endings, normalize_markdown,
};
use crate::schema::Schema;
use crate::snapshot::decode_node_snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    InternalNode,
    HostSlice,
    OfficeHtml,
    Files,
    BareUrl,
    InsideCode,
    IdeCode,
    Markdown,
    PlainText,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::InternalNode => "internal_node",
            RuleId::HostSlice => "host_slice",
            RuleId::OfficeHtml => "office_html",
            RuleId::Files => "files",
            RuleId::BareUrl => "bare_url",
            RuleId::InsideCode => "inside_code",
            RuleId::IdeCode => "ide_code",
            RuleId::Markdown => "markdown",
            RuleId::PlainText => "plain_text",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule decided to do with the gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Insert a copied node right before the selection.
    InsertNode { node: Node },
    /// Replace the selection with a fragment parsed from this editor's own HTML.
    ReplaceSelection { fragment: Fragment },
    /// Splice converted content, honouring the title slot.
    SpliceConverted { fragment: Fragment },
    IntakeFiles { files: Vec<PastedFile> },
    /// Link the selected text.
    LinkSelection { href: String },
    /// Insert the URL at the caret and link it.
    InsertLink { href: String },
    InsertText { text: String },
    InsertCodeBlock { language: String, text: String },
}

/// Everything a rule may consult; read before any mutation happens.
pub struct RuleContext<'a> {
    pub doc: &'a Document,
    pub schema: &'a Schema,
    pub selection: Selection,
    pub title: TitleContext,
    pub converters: &'a dyn ContentConverter,
    pub config: &'a PasteConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        editor: &'a Editor,
        converters: &'a dyn ContentConverter,
        config: &'a PasteConfig,
    ) -> Self {
        Self {
            doc: editor.doc(),
            schema: editor.schema(),
            selection: editor.selection(),
            title: TitleContext::inspect(editor.doc(), editor.schema()),
            converters,
            config,
        }
    }
}

pub type RuleFn = fn(&ClipboardPayload, &RuleContext<'_>) -> Result<Option<Plan>, PasteError>;

#[derive(Clone, Copy)]
pub struct PasteRule {
    pub id: RuleId,
    pub apply: RuleFn,
}

impl fmt::Debug for PasteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasteRule").field("id", &self.id).finish()
    }
}

pub const PASTE_RULES: &[PasteRule] = &[
    PasteRule {
        id: RuleId::InternalNode,
        apply: internal_node,
    },
    PasteRule {
        id: RuleId::HostSlice,
        apply: host_slice,
    },
    PasteRule {
        id: RuleId::OfficeHtml,
        apply: office_html,
    },
    PasteRule {
        id: RuleId::Files,
        apply: files,
    },
    PasteRule {
        id: RuleId::BareUrl,
        apply: bare_url,
    },
    PasteRule {
        id: RuleId::InsideCode,
        apply: inside_code,
    },
    PasteRule {
        id: RuleId::IdeCode,
        apply: ide_code,
    },
    PasteRule {
        id: RuleId::Markdown,
        apply: markdown,
    },
    PasteRule {
        id: RuleId::PlainText,
        apply: plain_text,
    },
];

/// Drops only ever hand files over.
pub const DROP_RULES: &[PasteRule] = &[PasteRule {
    id: RuleId::Files,
    apply: files,
}];

pub fn evaluate(
    rules: &[PasteRule],
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<(RuleId, Plan)>, PasteError> {
    for rule in rules {
        if let Some(plan) = (rule.apply)(payload, ctx)? {
            tracing::debug!(rule = %rule.id, "paste rule matched");
            return Ok(Some((rule.id, plan)));
        }
    }
    Ok(None)
}

pub fn internal_node(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    let Some(raw) = payload.internal_node.as_deref() else {
        return Ok(None);
    };
    match decode_node_snapshot(raw, ctx.schema) {
        Ok(node) => Ok(Some(Plan::InsertNode { node })),
        Err(err) => {
            tracing::warn!(%err, "ignoring malformed node snapshot");
            Ok(None)
        }
    }
}

pub fn host_slice(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if !payload.html.contains(&ctx.config.slice_marker) {
        return Ok(None);
    }
    let fragment = ctx
        .converters
        .html_slice_to_fragment(ctx.schema, &payload.html)?;
    Ok(Some(Plan::ReplaceSelection { fragment }))
}

pub fn office_html(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if !payload.html.contains(&ctx.config.office_marker) {
        return Ok(None);
    }
    let fragment = ctx.converters.html_to_document(
        ctx.schema,
        &payload.html,
        ctx.title.need_title(),
        None,
    )?;
    Ok(Some(Plan::SpliceConverted { fragment }))
}

pub fn files(
    payload: &ClipboardPayload,
    _ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if !payload.has_files() {
        return Ok(None);
    }
    Ok(Some(Plan::IntakeFiles {
        files: payload.files.clone(),
    }))
}

pub fn bare_url(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if !is_valid_url(&payload.plain_text) {
        return Ok(None);
    }
    let href = payload.plain_text.trim().to_string();
    if ctx.selection.is_empty() {
        Ok(Some(Plan::InsertLink { href }))
    } else {
        Ok(Some(Plan::LinkSelection { href }))
    }
}

pub fn inside_code(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if !caret_inside_code_block(ctx.doc, ctx.selection) {
        return Ok(None);
    }
    Ok(Some(Plan::InsertText {
        text: normalize_line_endings(&payload.plain_text),
    }))
}

pub fn ide_code(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    let Some(language) = payload.code_language.as_deref() else {
        return Ok(None);
    };
    if language == ctx.config.markdown_language {
        return Ok(None);
    }
    Ok(Some(Plan::InsertCodeBlock {
        language: language.to_string(),
        text: normalize_line_endings(&payload.plain_text),
    }))
}

pub fn markdown(
    payload: &ClipboardPayload,
    ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    let markdown_text = payload.markdown_text.as_deref().unwrap_or_default();
    let declared_markdown =
        payload.code_language.as_deref() == Some(ctx.config.markdown_language.as_str());
    let applies = !markdown_text.is_empty()
        || looks_like_markdown(&payload.plain_text)
        || payload.html.is_empty()
        || declared_markdown;
    if !applies {
        return Ok(None);
    }

    let source = if markdown_text.is_empty() {
        payload.plain_text.as_str()
    } else {
        markdown_text
    };
    if source.is_empty() {
        return Ok(None);
    }

    let fragment = ctx.converters.markdown_to_document(
        ctx.schema,
        &normalize_markdown(source),
        ctx.title.need_title(),
    )?;
    Ok(Some(Plan::SpliceConverted { fragment }))
}

pub fn plain_text(
    payload: &ClipboardPayload,
    _ctx: &RuleContext<'_>,
) -> Result<Option<Plan>, PasteError> {
    if payload.plain_text.is_empty() {
        return Ok(None);
    }
    Ok(Some(Plan::InsertText {
        text: payload.plain_text.clone(),
    }))
}
