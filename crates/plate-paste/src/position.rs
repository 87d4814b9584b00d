//! Linear positions over the document tree.
//!
//! Every text `char` and every void node occupies one position; an element adds one position
//! before and one after its content. Position `0` is the start of the document content.

use serde::{Deserialize, Serialize};

use crate::core::{ApplyError, Document, ElementKind, Marks, Node};
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    /// Builds an ordered selection from two ends in any order.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self {
            from: anchor.min(head),
            to: anchor.max(head),
        }
    }

    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    /// Child indexes from the document root down to the parent element.
    pub path: Vec<usize>,
    /// Kinds of the elements along `path`.
    pub ancestors: Vec<ElementKind>,
    /// Offset of the position inside the parent's content.
    pub parent_offset: usize,
}

impl ResolvedPos {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// `None` when the parent is the document itself.
    pub fn parent_kind(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    pub fn has_ancestor(&self, kind: &str) -> bool {
        self.ancestors.iter().any(|k| k == kind)
    }
}

pub fn resolve(doc: &Document, pos: usize) -> Result<ResolvedPos, ApplyError> {
    let size = doc.content_size();
    if pos > size {
        return Err(ApplyError::OutOfBounds { pos, size });
    }

    let mut path = Vec::new();
    let mut ancestors = Vec::new();
    let mut children = doc.children.as_slice();
    let mut offset = pos;

    'descend: loop {
        let mut start = 0;
        for (ix, child) in children.iter().enumerate() {
            let end = start + child.node_size();
            if offset > start && offset < end {
                if let Node::Element(el) = child {
                    path.push(ix);
                    ancestors.push(el.kind.clone());
                    offset -= start + 1;
                    children = &el.children;
                    continue 'descend;
                }
                break 'descend;
            }
            if offset <= start {
                break 'descend;
            }
            start = end;
        }
        break;
    }

    Ok(ResolvedPos {
        pos,
        path,
        ancestors,
        parent_offset: offset,
    })
}

/// Content ranges `(start, end)` of every textblock, in document order.
pub fn textblock_ranges(doc: &Document, schema: &Schema) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    collect_textblocks(&doc.children, 0, schema, &mut ranges);
    ranges
}

fn collect_textblocks(
    nodes: &[Node],
    base: usize,
    schema: &Schema,
    ranges: &mut Vec<(usize, usize)>,
) {
    let mut pos = base;
    for node in nodes {
        if let Node::Element(el) = node {
            let start = pos + 1;
            if schema.is_textblock_kind(&el.kind) {
                ranges.push((start, start + el.content_size()));
            } else {
                collect_textblocks(&el.children, start, schema, ranges);
            }
        }
        pos += node.node_size();
    }
}

/// The closest position inside a textblock, preferring the one at or before `pos`.
pub fn text_position_near(doc: &Document, schema: &Schema, pos: usize) -> usize {
    let ranges = textblock_ranges(doc, schema);
    if ranges.iter().any(|&(start, end)| start <= pos && pos <= end) {
        return pos;
    }
    if let Some(&(_, end)) = ranges.iter().rev().find(|&&(_, end)| end <= pos) {
        return end;
    }
    if let Some(&(start, _)) = ranges.iter().find(|&&(start, _)| start >= pos) {
        return start;
    }
    pos.min(doc.content_size())
}

/// Marks carried by the text right before `pos`, as inherited by typed or pasted text.
pub fn marks_before(doc: &Document, schema: &Schema, pos: usize) -> Marks {
    let Ok(resolved) = resolve(doc, pos) else {
        return Marks::default();
    };
    let Some(kind) = resolved.parent_kind() else {
        return Marks::default();
    };
    if !schema.allows_marks(kind) {
        return Marks::default();
    }
    let Some(children) = children_at(doc, &resolved.path) else {
        return Marks::default();
    };

    let mut start = 0;
    let mut marks = Marks::default();
    for child in children {
        if start >= resolved.parent_offset {
            break;
        }
        if let Node::Text(t) = child {
            marks = t.marks.clone();
        }
        start += child.node_size();
    }
    marks.link = None;
    marks
}

pub fn children_at<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a [Node]> {
    let mut children = doc.children.as_slice();
    for &ix in path {
        children = match children.get(ix)? {
            Node::Element(el) => &el.children,
            Node::Text(_) | Node::Void(_) => return None,
        };
    }
    Some(children)
}

/// Keeps the part of `nodes` that lies between content offsets `from` and `to`. Elements cut in
/// the middle keep their wrapper around the cut content.
pub fn cut_content(nodes: &[Node], from: usize, to: usize) -> Vec<Node> {
    let mut out = Vec::new();
    if from >= to {
        return out;
    }

    let mut pos = 0;
    for node in nodes {
        let size = node.node_size();
        let end = pos + size;
        if end > from && pos < to {
            out.push(cut_node(node, from.saturating_sub(pos), to - pos));
        }
        pos = end;
        if pos >= to {
            break;
        }
    }
    out
}

/// `from`/`to` are relative to the node's own start.
fn cut_node(node: &Node, from: usize, to: usize) -> Node {
    let size = node.node_size();
    if from == 0 && to >= size {
        return node.clone();
    }
    match node {
        Node::Text(t) => Node::marked_text(char_slice(&t.text, from, to), t.marks.clone()),
        Node::Void(_) => node.clone(),
        Node::Element(el) => {
            let content = el.content_size();
            let inner_from = from.saturating_sub(1).min(content);
            let inner_to = to.saturating_sub(1).min(content);
            el.with_children(cut_content(&el.children, inner_from, inner_to))
        }
    }
}

pub fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}

