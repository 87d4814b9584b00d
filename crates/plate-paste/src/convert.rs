//! Collaborators the paste pipeline calls out to but does not implement.

use thiserror::Error;

use crate::core::{Attrs, Fragment, Node};
use crate::payload::PastedFile;
use crate::schema::{PARAGRAPH, Schema, TITLE};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{format} conversion is not supported")]
    Unsupported { format: &'static str },
    #[error("could not convert {format}: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Turns foreign content into document fragments and back.
///
/// Fragments returned with `need_title` set must start with a title node.
pub trait ContentConverter: Send + Sync {
    fn markdown_to_document(
        &self,
        schema: &Schema,
        markdown: &str,
        need_title: bool,
    ) -> Result<Fragment, ConvertError>;

    fn html_to_document(
        &self,
        schema: &Schema,
        html: &str,
        need_title: bool,
        default_title: Option<&str>,
    ) -> Result<Fragment, ConvertError>;

    /// Parses HTML this editor serialized itself (it carries the slice marker).
    fn html_slice_to_fragment(&self, schema: &Schema, html: &str) -> Result<Fragment, ConvertError>;

    fn document_to_markdown(&self, fragment: &[Node]) -> Result<String, ConvertError>;
}

/// Receives pasted or dropped files. Uploading is up to the implementation.
pub trait FileIntake: Send + Sync {
    fn intake(&self, file: &PastedFile);
}

impl<F> FileIntake for F
where
    F: Fn(&PastedFile) + Send + Sync,
{
    fn intake(&self, file: &PastedFile) {
        self(file)
    }
}

/// Converter for hosts without a markdown engine: one paragraph per non-blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextConverter;

impl ContentConverter for PlainTextConverter {
    fn markdown_to_document(
        &self,
        _schema: &Schema,
        markdown: &str,
        need_title: bool,
    ) -> Result<Fragment, ConvertError> {
        let mut fragment = Vec::new();
        if need_title {
            fragment.push(Node::title(""));
        }
        fragment.extend(
            markdown
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(Node::paragraph),
        );
        Ok(fragment)
    }

    fn html_to_document(
        &self,
        _schema: &Schema,
        _html: &str,
        _need_title: bool,
        _default_title: Option<&str>,
    ) -> Result<Fragment, ConvertError> {
        Err(ConvertError::Unsupported { format: "html" })
    }

    fn html_slice_to_fragment(
        &self,
        _schema: &Schema,
        _html: &str,
    ) -> Result<Fragment, ConvertError> {
        Err(ConvertError::Unsupported { format: "html" })
    }

    fn document_to_markdown(&self, fragment: &[Node]) -> Result<String, ConvertError> {
        let mut blocks = Vec::new();
        write_blocks(fragment, "", &mut blocks);
        Ok(blocks.join("\n\n"))
    }
}

fn write_blocks(nodes: &[Node], prefix: &str, out: &mut Vec<String>) {
    for node in nodes {
        let Node::Element(el) = node else {
            if node.kind() == "divider" {
                out.push(format!("{prefix}---"));
            }
            continue;
        };
        let text = node.text_content();
        match el.kind.as_str() {
            TITLE => out.push(format!("{prefix}# {text}")),
            "heading" => {
                let level = heading_level(&el.attrs);
                out.push(format!("{prefix}{} {text}", "#".repeat(level)));
            }
            "code_block" => {
                let language = el
                    .attrs
                    .get("language")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                out.push(format!("{prefix}```{language}\n{text}\n{prefix}```"));
            }
            "blockquote" => write_blocks(&el.children, &format!("{prefix}> "), out),
            "bullet_list" | "ordered_list" => {
                let ordered = el.kind == "ordered_list";
                let mut items = Vec::new();
                for (ix, item) in el.children.iter().enumerate() {
                    let marker = if ordered {
                        format!("{}. ", ix + 1)
                    } else {
                        "- ".to_string()
                    };
                    let mut inner = Vec::new();
                    write_blocks(item.children(), "", &mut inner);
                    items.push(format!("{prefix}{marker}{}", inner.join(" ")));
                }
                out.push(items.join("\n"));
            }
            PARAGRAPH => out.push(format!("{prefix}{text}")),
            _ => write_blocks(&el.children, prefix, out),
        }
    }
}

fn heading_level(attrs: &Attrs) -> usize {
    attrs
        .get("level")
        .and_then(|v| v.as_u64())
        .map(|level| level.clamp(1, 6) as usize)
        .unwrap_or(1)
}
