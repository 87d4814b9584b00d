//! Structural replace and mark application over linear positions.

use serde::{Deserialize, Serialize};

use crate::core::{
    ApplyError, Attrs, Document, ElementNode, Mark, Node, content_size, normalize_inline,
};
use crate::position::{char_slice, cut_content};
use crate::schema::{PARAGRAPH, Schema};

/// Where inserted content landed, in positions of the resulting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    fn shift(self, by: usize) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

/// Replaces `from..to` with `fragment`.
///
/// Inline fragments are spliced into the surrounding textblock, joining the textblocks on both
/// ends of the range. Block fragments split the textblock they land in; halves left empty by the
/// split are dropped.
pub fn replace(
    doc: &Document,
    from: usize,
    to: usize,
    fragment: &[Node],
    schema: &Schema,
) -> Result<(Document, Span), ApplyError> {
    check_range(doc, from, to)?;
    let inline = fragment.iter().all(|node| schema.is_inline(node));
    let (children, span) = replace_in(
        &doc.children,
        "doc",
        false,
        from,
        to,
        fragment,
        inline,
        schema,
    )?;
    Ok((Document::new(children), span))
}

pub fn add_mark(
    doc: &Document,
    from: usize,
    to: usize,
    mark: &Mark,
    schema: &Schema,
) -> Result<Document, ApplyError> {
    check_range(doc, from, to)?;
    Ok(Document::new(mark_nodes(
        &doc.children,
        from,
        to,
        mark,
        false,
        schema,
    )))
}

fn check_range(doc: &Document, from: usize, to: usize) -> Result<(), ApplyError> {
    if from > to {
        return Err(ApplyError::InvalidRange { from, to });
    }
    let size = doc.content_size();
    if to > size {
        return Err(ApplyError::OutOfBounds { pos: to, size });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn replace_in(
    children: &[Node],
    parent: &str,
    textblock: bool,
    from: usize,
    to: usize,
    fragment: &[Node],
    inline: bool,
    schema: &Schema,
) -> Result<(Vec<Node>, Span), ApplyError> {
    if textblock {
        if !inline {
            return Err(ApplyError::BlockInTextblock(parent.to_string()));
        }
        let fitted = fit_inline(fragment, schema.allows_marks(parent));
        let inserted = content_size(&fitted);
        let mut out = cut_content(children, 0, from);
        out.extend(fitted);
        out.extend(cut_content(children, to, content_size(children)));
        let span = Span {
            start: from,
            end: from + inserted,
        };
        return Ok((normalize_inline(out), span));
    }

    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut left = None;
    let mut right = None;
    let mut pos = 0;
    for (ix, child) in children.iter().enumerate() {
        let end = pos + child.node_size();
        if end <= from {
            before.push(child.clone());
        } else if pos >= to {
            after.push(child.clone());
        } else if pos < from && to < end {
            return replace_inside_child(children, ix, pos, from, to, fragment, inline, schema);
        } else {
            if pos < from {
                left = Some(truncate(child, 0, from - pos - 1));
            }
            if to < end {
                right = Some(truncate(child, to - pos - 1, child.content_size()));
            }
        }
        pos = end;
    }

    Ok(assemble(before, left, right, after, fragment, inline, schema))
}

#[allow(clippy::too_many_arguments)]
fn replace_inside_child(
    children: &[Node],
    ix: usize,
    pos: usize,
    from: usize,
    to: usize,
    fragment: &[Node],
    inline: bool,
    schema: &Schema,
) -> Result<(Vec<Node>, Span), ApplyError> {
    let Node::Element(el) = &children[ix] else {
        return Err(ApplyError::InvalidRange { from, to });
    };
    let inner_from = from - pos - 1;
    let inner_to = to - pos - 1;
    let child_is_textblock = schema.is_textblock_kind(&el.kind);

    if inline || !child_is_textblock {
        let (inner, span) = replace_in(
            &el.children,
            &el.kind,
            child_is_textblock,
            inner_from,
            inner_to,
            fragment,
            inline,
            schema,
        )?;
        let mut out = children.to_vec();
        out[ix] = el.with_children(inner);
        return Ok((out, span.shift(pos + 1)));
    }

    let left = el.with_children(cut_content(&el.children, 0, inner_from));
    let right = el.with_children(cut_content(&el.children, inner_to, el.content_size()));
    let (middle, span) = assemble(
        Vec::new(),
        Some(left),
        Some(right),
        Vec::new(),
        fragment,
        false,
        schema,
    );

    let mut out = children[..ix].to_vec();
    let offset = content_size(&out);
    out.extend(middle);
    out.extend_from_slice(&children[ix + 1..]);
    Ok((out, span.shift(offset)))
}

fn assemble(
    before: Vec<Node>,
    left: Option<Node>,
    right: Option<Node>,
    after: Vec<Node>,
    fragment: &[Node],
    inline: bool,
    schema: &Schema,
) -> (Vec<Node>, Span) {
    let mut out = before;
    let span;

    if inline {
        let left_block = as_textblock(&left, schema);
        let right_block = as_textblock(&right, schema);
        match (left_block, right_block) {
            (Some(l), Some(r)) => {
                let marks = schema.allows_marks(&l.kind);
                let fitted = fit_inline(fragment, marks);
                let start = content_size(&out) + 1 + l.content_size();
                span = Span {
                    start,
                    end: start + content_size(&fitted),
                };
                let mut joined = l.children.clone();
                joined.extend(fitted);
                joined.extend(fit_inline(&r.children, marks));
                out.push(l.with_children(normalize_inline(joined)));
            }
            (Some(l), None) => {
                let fitted = fit_inline(fragment, schema.allows_marks(&l.kind));
                let start = content_size(&out) + 1 + l.content_size();
                span = Span {
                    start,
                    end: start + content_size(&fitted),
                };
                let mut joined = l.children.clone();
                joined.extend(fitted);
                out.push(l.with_children(normalize_inline(joined)));
                out.extend(right);
            }
            (None, Some(r)) => {
                out.extend(left);
                let mut joined = fit_inline(fragment, schema.allows_marks(&r.kind));
                let start = content_size(&out) + 1;
                span = Span {
                    start,
                    end: start + content_size(&joined),
                };
                joined.extend(r.children.iter().cloned());
                out.push(r.with_children(normalize_inline(joined)));
            }
            (None, None) => {
                out.extend(left);
                if fragment.is_empty() {
                    let at = content_size(&out);
                    span = Span { start: at, end: at };
                } else {
                    let wrapped = fit_inline(fragment, true);
                    let start = content_size(&out) + 1;
                    span = Span {
                        start,
                        end: start + content_size(&wrapped),
                    };
                    out.push(Node::element(PARAGRAPH, Attrs::default(), normalize_inline(wrapped)));
                }
                out.extend(right);
            }
        }
    } else {
        out.extend(left.filter(|node| !is_empty_element(node)));
        let start = content_size(&out);
        out.extend(fragment.iter().cloned());
        span = Span {
            start,
            end: content_size(&out),
        };
        out.extend(right.filter(|node| !is_empty_element(node)));
    }

    out.extend(after);
    (out, span)
}

fn as_textblock(node: &Option<Node>, schema: &Schema) -> Option<ElementNode> {
    match node {
        Some(Node::Element(el)) if schema.is_textblock_kind(&el.kind) => Some(el.clone()),
        _ => None,
    }
}

fn is_empty_element(node: &Node) -> bool {
    matches!(node, Node::Element(el) if el.children.is_empty())
}

/// Keeps the content of `node` between `from` and `to`, relative to its content start.
fn truncate(node: &Node, from: usize, to: usize) -> Node {
    match node {
        Node::Element(el) => el.with_children(cut_content(&el.children, from, to)),
        Node::Text(_) | Node::Void(_) => node.clone(),
    }
}

/// Strips marks from inline content headed for a parent that does not allow them.
fn fit_inline(nodes: &[Node], marks_allowed: bool) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(t) if !marks_allowed && !t.marks.is_empty() => Node::text(t.text.clone()),
            other => other.clone(),
        })
        .collect()
}

fn mark_nodes(
    nodes: &[Node],
    from: usize,
    to: usize,
    mark: &Mark,
    marks_allowed: bool,
    schema: &Schema,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut pos = 0;
    for node in nodes {
        let size = node.node_size();
        let end = pos + size;
        if end <= from || pos >= to {
            out.push(node.clone());
            pos = end;
            continue;
        }

        match node {
            Node::Text(t) if marks_allowed => {
                let a = from.saturating_sub(pos);
                let b = (to - pos).min(size);
                out.push(Node::marked_text(char_slice(&t.text, 0, a), t.marks.clone()));
                out.push(Node::marked_text(
                    char_slice(&t.text, a, b),
                    t.marks.clone().with(mark),
                ));
                out.push(Node::marked_text(char_slice(&t.text, b, size), t.marks.clone()));
            }
            Node::Element(el) => {
                let inner = mark_nodes(
                    &el.children,
                    from.saturating_sub(pos + 1),
                    to.saturating_sub(pos + 1),
                    mark,
                    schema.allows_marks(&el.kind),
                    schema,
                );
                let inner = if schema.is_textblock_kind(&el.kind) {
                    normalize_inline(inner)
                } else {
                    inner
                };
                out.push(el.with_children(inner));
            }
            _ => out.push(node.clone()),
        }
        pos = end;
    }
    out
}
