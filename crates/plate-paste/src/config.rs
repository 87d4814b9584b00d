use serde::{Deserialize, Serialize};

const DEFAULT_SLICE_MARKER: &str = "data-pm-slice";
const DEFAULT_OFFICE_MARKER: &str = "urn:schemas-microsoft-com:office";
const DEFAULT_MARKDOWN_LANGUAGE: &str = "markdown";

/// Markers the paste rules look for. Every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Attribute this editor writes into HTML it serializes.
    pub slice_marker: String,
    /// Namespace office suites embed in their clipboard HTML.
    pub office_marker: String,
    /// Language id that routes IDE-copied text to the markdown rule instead of a code block.
    pub markdown_language: String,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            slice_marker: DEFAULT_SLICE_MARKER.to_string(),
            office_marker: DEFAULT_OFFICE_MARKER.to_string(),
            markdown_language: DEFAULT_MARKDOWN_LANGUAGE.to_string(),
        }
    }
}

impl PasteConfig {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
