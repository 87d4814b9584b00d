//! Platform clipboard/drag data reduced to one immutable payload per gesture.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PLAIN_TEXT_FORMAT: &str = "text/plain";
pub const HTML_FORMAT: &str = "text/html";
pub const MARKDOWN_FORMAT: &str = "text/markdown";
pub const NODE_SNAPSHOT_FORMAT: &str = "text/node";
/// Metadata VS Code attaches to copied code; carries the language id in `mode`.
pub const CODE_ORIGIN_FORMAT: &str = "vscode-editor-data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastedFile {
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl PastedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What a host's clipboard or drag event exposes. Implemented once per platform.
pub trait DataTransfer {
    fn data(&self, format: &str) -> Option<String>;
    fn files(&self) -> Vec<PastedFile>;
}

/// In-memory [`DataTransfer`], keyed by format name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeBundle {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    #[serde(default)]
    files: Vec<PastedFile>,
}

impl MimeBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, format: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(format.into(), value.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_data(PLAIN_TEXT_FORMAT, text)
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.with_data(HTML_FORMAT, html)
    }

    pub fn with_file(mut self, file: PastedFile) -> Self {
        self.files.push(file);
        self
    }
}

impl DataTransfer for MimeBundle {
    fn data(&self, format: &str) -> Option<String> {
        self.entries.get(format).cloned()
    }

    fn files(&self) -> Vec<PastedFile> {
        self.files.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub plain_text: String,
    pub html: String,
    /// Serialized node copied from an editor, untouched until a rule parses it.
    pub internal_node: Option<String>,
    pub markdown_text: Option<String>,
    pub code_language: Option<String>,
    pub files: Vec<PastedFile>,
}

#[derive(Deserialize)]
struct CodeOrigin {
    #[serde(default)]
    mode: Option<String>,
}

impl ClipboardPayload {
    pub fn from_transfer(source: &dyn DataTransfer) -> Self {
        let text = |format: &str| source.data(format).unwrap_or_default();
        let present = |format: &str| source.data(format).filter(|value| !value.is_empty());

        let code_language = present(CODE_ORIGIN_FORMAT).and_then(|raw| {
            match serde_json::from_str::<CodeOrigin>(&raw) {
                Ok(origin) => origin.mode.filter(|mode| !mode.is_empty()),
                Err(err) => {
                    tracing::debug!(%err, "ignoring unreadable code origin metadata");
                    None
                }
            }
        });

        Self {
            plain_text: text(PLAIN_TEXT_FORMAT),
            html: text(HTML_FORMAT),
            internal_node: present(NODE_SNAPSHOT_FORMAT),
            markdown_text: present(MARKDOWN_FORMAT),
            code_language,
            files: source.files(),
        }
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

impl From<&MimeBundle> for ClipboardPayload {
    fn from(bundle: &MimeBundle) -> Self {
        Self::from_transfer(bundle)
    }
}
