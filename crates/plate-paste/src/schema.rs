use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::core::{Attrs, Document, Node};

pub const TITLE: &str = "title";
pub const PARAGRAPH: &str = "paragraph";
pub const CODE_BLOCK: &str = "code_block";
pub const MIND: &str = "mind";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
    /// Whether text directly inside this node may carry marks.
    pub marks: bool,
    #[serde(default)]
    pub default_attrs: Attrs,
}

impl NodeSpec {
    fn textblock(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::InlineOnly,
            marks: true,
            default_attrs: Attrs::default(),
        }
    }

    fn container(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            is_void: false,
            children: ChildConstraint::BlockOnly,
            marks: false,
            default_attrs: Attrs::default(),
        }
    }

    fn void(kind: &str, role: NodeRole) -> Self {
        Self {
            kind: kind.to_string(),
            role,
            is_void: true,
            children: ChildConstraint::None,
            marks: false,
            default_attrs: Attrs::default(),
        }
    }

    fn without_marks(mut self) -> Self {
        self.marks = false;
        self
    }

    fn default_attr(mut self, key: &str, value: serde_json::Value) -> Self {
        self.default_attrs.insert(key.to_string(), value);
        self
    }

    pub fn is_textblock(&self) -> bool {
        self.children == ChildConstraint::InlineOnly
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown node kind `{0}`")]
    UnknownKind(String),
    #[error("`{child}` is not allowed inside `{parent}`")]
    InvalidChild { parent: String, child: String },
    #[error("`{0}` must be declared as {1} node")]
    WrongShape(String, &'static str),
    #[error("a title may only appear as the first node of the document")]
    MisplacedTitle,
    #[error("text inside `{0}` cannot carry marks")]
    MarksNotAllowed(String),
}

/// The node kinds a document may contain and how they nest.
#[derive(Debug, Clone)]
pub struct Schema {
    specs: HashMap<String, NodeSpec>,
}

impl Schema {
    pub fn new(specs: impl IntoIterator<Item = NodeSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.kind.clone(), spec))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new([
            NodeSpec::textblock(TITLE).without_marks(),
            NodeSpec::textblock(PARAGRAPH),
            NodeSpec::textblock("heading").default_attr("level", json!(1)),
            NodeSpec::textblock(CODE_BLOCK)
                .without_marks()
                .default_attr("language", serde_json::Value::Null),
            NodeSpec::container("blockquote"),
            NodeSpec::container("bullet_list"),
            NodeSpec::container("ordered_list").default_attr("start", json!(1)),
            NodeSpec::container("list_item"),
            NodeSpec::void("divider", NodeRole::Block),
            NodeSpec::void("image", NodeRole::Block),
            mind_spec(),
            NodeSpec::void("mention", NodeRole::Inline),
            NodeSpec::void("hard_break", NodeRole::Inline),
        ])
    }

    /// The standard schema without a reserved title slot.
    pub fn without_title() -> Self {
        let mut schema = Self::standard();
        schema.specs.remove(TITLE);
        schema
    }

    pub fn node_spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.specs.get(kind)
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.specs
    }

    pub fn has_title_slot(&self) -> bool {
        self.specs.contains_key(TITLE)
    }

    pub fn is_textblock_kind(&self, kind: &str) -> bool {
        self.node_spec(kind).is_some_and(NodeSpec::is_textblock)
    }

    pub fn is_textblock(&self, node: &Node) -> bool {
        match node {
            Node::Element(el) => self.is_textblock_kind(&el.kind),
            Node::Text(_) | Node::Void(_) => false,
        }
    }

    pub fn allows_marks(&self, kind: &str) -> bool {
        self.node_spec(kind).is_some_and(|spec| spec.marks)
    }

    pub fn is_inline(&self, node: &Node) -> bool {
        match node {
            Node::Text(_) => true,
            Node::Element(el) => self
                .node_spec(&el.kind)
                .is_some_and(|spec| spec.role == NodeRole::Inline),
            Node::Void(v) => self
                .node_spec(&v.kind)
                .is_some_and(|spec| spec.role == NodeRole::Inline),
        }
    }

    /// Fills attributes the node leaves unset from its spec's defaults, recursively.
    pub fn fill_default_attrs(&self, node: &mut Node) {
        let (kind, attrs) = match node {
            Node::Element(el) => {
                for child in &mut el.children {
                    self.fill_default_attrs(child);
                }
                (el.kind.as_str(), &mut el.attrs)
            }
            Node::Void(v) => (v.kind.as_str(), &mut v.attrs),
            Node::Text(_) => return,
        };
        let Some(spec) = self.specs.get(kind) else {
            return;
        };
        for (key, value) in &spec.default_attrs {
            attrs.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub fn check_document(&self, doc: &Document) -> Result<(), SchemaError> {
        for (ix, child) in doc.children.iter().enumerate() {
            if child.kind() == TITLE && ix != 0 {
                return Err(SchemaError::MisplacedTitle);
            }
            self.check_child("doc", true, false, child)?;
        }
        Ok(())
    }

    /// Validates a node that will live directly inside a block container.
    pub fn check_block(&self, node: &Node) -> Result<(), SchemaError> {
        self.check_child("doc", true, false, node)
    }

    fn check_child(
        &self,
        parent: &str,
        expects_block: bool,
        marks_allowed: bool,
        node: &Node,
    ) -> Result<(), SchemaError> {
        let invalid = || SchemaError::InvalidChild {
            parent: parent.to_string(),
            child: node.kind().to_string(),
        };

        if let Node::Text(t) = node {
            if expects_block {
                return Err(invalid());
            }
            if !marks_allowed && !t.marks.is_empty() {
                return Err(SchemaError::MarksNotAllowed(parent.to_string()));
            }
            return Ok(());
        }

        let spec = self
            .node_spec(node.kind())
            .ok_or_else(|| SchemaError::UnknownKind(node.kind().to_string()))?;
        if (spec.role == NodeRole::Block) != expects_block {
            return Err(invalid());
        }
        if node.kind() == TITLE && parent != "doc" {
            return Err(SchemaError::MisplacedTitle);
        }

        match (node, spec.is_void) {
            (Node::Void(_), true) => Ok(()),
            (Node::Element(el), false) => {
                let children_are_blocks = match spec.children {
                    ChildConstraint::BlockOnly => true,
                    ChildConstraint::InlineOnly => false,
                    ChildConstraint::None => {
                        return match el.children.first() {
                            Some(first) => Err(SchemaError::InvalidChild {
                                parent: el.kind.clone(),
                                child: first.kind().to_string(),
                            }),
                            None => Ok(()),
                        };
                    }
                };
                for child in &el.children {
                    self.check_child(&el.kind, children_are_blocks, spec.marks, child)?;
                }
                Ok(())
            }
            (Node::Void(_), false) => Err(SchemaError::WrongShape(
                node.kind().to_string(),
                "an element",
            )),
            _ => Err(SchemaError::WrongShape(node.kind().to_string(), "a void")),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

fn mind_spec() -> NodeSpec {
    NodeSpec::void(MIND, NodeRole::Block)
        .default_attr("defaultShowPicker", json!(false))
        .default_attr("createUser", serde_json::Value::Null)
        .default_attr("width", json!("100%"))
        .default_attr("height", json!(240))
        .default_attr(
            "data",
            json!({
                "root": { "data": { "text": "Central topic" }, "children": [] },
                "template": "default",
                "theme": "fresh-purple",
                "version": "1.4.43",
            }),
        )
        .default_attr("template", json!("default"))
        .default_attr("theme", json!("fresh-purple"))
}
