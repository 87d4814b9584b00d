//! Pure classification helpers consulted by the paste rules.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::core::{Document, Node};
use crate::position::{Selection, resolve};
use crate::schema::{CODE_BLOCK, Schema, TITLE};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```").expect("code fence regex"));
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]+\]\((?:https?://|/)\S+\)").expect("markdown link regex")
});
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+\S+").expect("heading regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:\d+[.)]|[-*+])\s+\S+").expect("list item regex"));

/// Whether `text` is a single absolute link worth turning into a link mark.
pub fn is_valid_url(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(text) else {
        return false;
    };
    match url.scheme() {
        "http" | "https" | "ftp" => url.host_str().is_some_and(|host| !host.is_empty()),
        "mailto" => !url.path().is_empty(),
        _ => false,
    }
}

/// Heuristic: fenced code (two fences), a markdown link, a heading, or at least two list items.
pub fn looks_like_markdown(text: &str) -> bool {
    if CODE_FENCE.find_iter(text).count() > 1 {
        return true;
    }
    if MARKDOWN_LINK.is_match(text) || HEADING.is_match(text) {
        return true;
    }
    LIST_ITEM.find_iter(text).count() > 1
}

/// True when the selection starts (and, if not collapsed, ends) inside a code block.
pub fn caret_inside_code_block(doc: &Document, selection: Selection) -> bool {
    let in_code = |pos: usize| {
        resolve(doc, pos)
            .map(|resolved| resolved.has_ancestor(CODE_BLOCK))
            .unwrap_or(false)
    };
    in_code(selection.from) && (selection.is_empty() || in_code(selection.to))
}

pub fn is_title_node(node: Option<&Node>) -> bool {
    node.is_some_and(|node| node.kind() == TITLE)
}

pub fn title_is_filled(node: Option<&Node>) -> bool {
    is_title_node(node) && node.is_some_and(|node| node.content_size() > 0)
}

/// CRLF and lone CR become LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Line endings normalized and a leading byte-order mark removed.
pub fn normalize_markdown(text: &str) -> String {
    normalize_line_endings(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Whether converters must synthesize a title for the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TitleContext {
    pub document_has_title_slot: bool,
    pub title_already_filled: bool,
}

impl TitleContext {
    pub fn inspect(doc: &Document, schema: &Schema) -> Self {
        Self {
            document_has_title_slot: schema.has_title_slot(),
            title_already_filled: title_is_filled(doc.first_child()),
        }
    }

    pub fn need_title(&self) -> bool {
        self.document_has_title_slot && !self.title_already_filled
    }
}

/// Position right after a leading title node, if the document has one.
pub fn title_end(doc: &Document) -> Option<usize> {
    doc.first_child()
        .filter(|node| is_title_node(Some(node)))
        .map(Node::node_size)
}
