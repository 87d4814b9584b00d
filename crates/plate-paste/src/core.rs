use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ops::Transaction;
use crate::position::{Selection, text_position_near};
use crate::schema::{Schema, SchemaError};

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;
pub type Fragment = Vec<Node>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn content_size(&self) -> usize {
        content_size(&self.children)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Text of every textblock, one block per line.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        collect_block_text(&self.children, &mut lines);
        lines.join("\n")
    }
}

fn collect_block_text(nodes: &[Node], lines: &mut Vec<String>) {
    for node in nodes {
        let Node::Element(el) = node else { continue };
        let has_blocks = el.children.iter().any(|child| match child {
            Node::Element(_) => true,
            Node::Text(_) | Node::Void(_) => false,
        });
        if has_blocks {
            collect_block_text(&el.children, lines);
        } else {
            lines.push(node.text_content());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn marked_text(text: impl Into<String>, marks: Marks) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn element(kind: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs,
            children,
        })
    }

    pub fn void(kind: impl Into<String>, attrs: Attrs) -> Self {
        Node::Void(VoidNode {
            kind: kind.into(),
            attrs,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        textblock("paragraph", Attrs::default(), text.into())
    }

    pub fn title(text: impl Into<String>) -> Self {
        textblock("title", Attrs::default(), text.into())
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("level".to_string(), level.into());
        textblock("heading", attrs, text.into())
    }

    pub fn code_block(language: impl Into<String>, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("language".to_string(), language.into().into());
        textblock("code_block", attrs, text.into())
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Node::element("blockquote", Attrs::default(), children)
    }

    pub fn divider() -> Self {
        Node::void("divider", Attrs::default())
    }

    /// `"text"` for text leaves, the element/void kind otherwise.
    pub fn kind(&self) -> &str {
        match self {
            Node::Element(el) => &el.kind,
            Node::Void(v) => &v.kind,
            Node::Text(_) => "text",
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) | Node::Void(_) => &[],
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Element(el) => Some(&el.attrs),
            Node::Void(v) => Some(&v.attrs),
            Node::Text(_) => None,
        }
    }

    /// Size of the node in the linear position space.
    pub fn node_size(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            Node::Void(_) => 1,
            Node::Element(el) => el.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        match self {
            Node::Element(el) => el.content_size(),
            Node::Text(t) => t.len(),
            Node::Void(_) => 0,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Void(v) => v.inline_text(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }
}

fn textblock(kind: &str, attrs: Attrs, text: String) -> Node {
    let children = if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    };
    Node::element(kind, attrs, children)
}

pub fn content_size(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::node_size).sum()
}

/// Drops empty text leaves and merges neighbours that carry the same marks.
pub fn normalize_inline(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(t) if t.text.is_empty() => {}
            Node::Text(t) => match out.last_mut() {
                Some(Node::Text(prev)) if prev.marks == t.marks => prev.text.push_str(&t.text),
                _ => out.push(Node::Text(t)),
            },
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn content_size(&self) -> usize {
        content_size(&self.children)
    }

    pub fn with_children(&self, children: Vec<Node>) -> Node {
        Node::Element(ElementNode {
            kind: self.kind.clone(),
            attrs: self.attrs.clone(),
            children,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

impl VoidNode {
    pub fn inline_text(&self) -> String {
        match self.kind.as_str() {
            "mention" => {
                let label = self
                    .attrs
                    .get("label")
                    .and_then(|v| v.as_str())
                    .unwrap_or("mention");
                if label.starts_with('@') {
                    label.to_string()
                } else {
                    format!("@{label}")
                }
            }
            "hard_break" => "\n".to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl TextNode {
    /// Length in positions (one per `char`).
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Marks {
    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }

    pub fn with(mut self, mark: &Mark) -> Self {
        match mark {
            Mark::Bold => self.bold = true,
            Mark::Italic => self.italic = true,
            Mark::Underline => self.underline = true,
            Mark::Strikethrough => self.strikethrough = true,
            Mark::Code => self.code = true,
            Mark::Link { href } => self.link = Some(href.clone()),
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mark", rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Link { href: String },
}

impl Mark {
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link { href: href.into() }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("position {pos} is outside the document (content size {size})")]
    OutOfBounds { pos: usize, size: usize },
    #[error("invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },
    #[error("block content cannot be placed inside `{0}`")]
    BlockInTextblock(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone)]
struct Snapshot {
    doc: Document,
    selection: Selection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub max_undo: usize,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct TransactionPreview {
    pub doc: Document,
    pub selection: Selection,
}

/// One editing session: the only actor allowed to mutate its document.
pub struct Editor {
    doc: Document,
    selection: Selection,
    schema: Arc<Schema>,
    config: EditorConfig,
    editable: bool,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Editor {
    pub fn new(
        doc: Document,
        selection: Selection,
        schema: Arc<Schema>,
    ) -> Result<Self, ApplyError> {
        schema.check_document(&doc)?;
        let size = doc.content_size();
        if selection.to > size {
            return Err(ApplyError::OutOfBounds {
                pos: selection.to,
                size,
            });
        }
        Ok(Self {
            doc,
            selection,
            schema,
            config: EditorConfig::default().with_defaults(),
            editable: true,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        })
    }

    /// A fresh document: an empty title (when the schema has a title slot) and one empty
    /// paragraph holding the caret.
    pub fn empty(schema: Arc<Schema>) -> Self {
        let mut children = Vec::new();
        if schema.has_title_slot() {
            children.push(Node::title(""));
        }
        children.push(Node::paragraph(""));
        let doc = Document::new(children);
        let caret = doc.content_size() - 1;
        Self {
            doc,
            selection: Selection::caret(caret),
            schema,
            config: EditorConfig::default().with_defaults(),
            editable: true,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config.with_defaults();
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let size = self.doc.content_size();
        self.selection = Selection::new(selection.from.min(size), selection.to.min(size));
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    /// Applies every step or none of them.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let TransactionPreview { doc, selection } = self.preview_transaction(&tx)?;

        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        tracing::debug!(
            source = tx.meta.source.as_deref().unwrap_or("unknown"),
            steps = tx.steps.len(),
            "applied transaction"
        );
        self.doc = doc;
        self.selection = selection;
        Ok(())
    }

    pub fn preview_transaction(&self, tx: &Transaction) -> Result<TransactionPreview, ApplyError> {
        let mut doc = self.doc.clone();
        for step in &tx.steps {
            doc = step.apply(&doc, &self.schema)?.0;
        }
        self.schema.check_document(&doc)?;

        let size = doc.content_size();
        let selection = match tx.selection_after {
            Some(sel) => {
                if sel.to > size {
                    return Err(ApplyError::OutOfBounds { pos: sel.to, size });
                }
                sel
            }
            None => {
                let caret = text_position_near(&doc, &self.schema, self.selection.from.min(size));
                Selection::caret(caret)
            }
        };

        Ok(TransactionPreview { doc, selection })
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.selection = snapshot.selection;
    }
}
