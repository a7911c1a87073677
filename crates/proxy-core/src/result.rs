//! `ToolCallResult` and its content parts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One part of a tool result's content sequence.
///
/// Mirrors the small set of content kinds an MCP client renders; `Json` is
/// carried separately from `Text` rather than folded into it so a plugin
/// can tell structured payloads from prose without re-parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text content.
    Text {
        /// The text itself.
        text: String,
    },
    /// Structured JSON content.
    Json {
        /// The JSON value.
        value: Value,
    },
}

impl ContentPart {
    /// Build a text content part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Build a JSON content part.
    pub fn json(value: Value) -> Self {
        ContentPart::Json { value }
    }

    /// The text of this part, if it is a [`ContentPart::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::Json { .. } => None,
        }
    }
}

/// The result of a tool call, as it travels through the after-hook chain.
///
/// Invariant: once the after phase has completed, `content` is non-empty or
/// `is_error` is `true` (see [`ToolCallResult::is_well_formed`]).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolCallResult {
    /// Ordered content parts.
    pub content: Vec<ContentPart>,
    /// Whether this result represents an error.
    pub is_error: bool,
    /// Opaque metadata passed through unchanged by the pipeline.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ToolCallResult {
    /// Build a successful text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(text)],
            is_error: false,
            meta: None,
        }
    }

    /// Build an error result with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::text(message)],
            is_error: true,
            meta: None,
        }
    }

    /// Whether this result satisfies the data-model invariant: non-empty
    /// content, or marked as an error.
    pub fn is_well_formed(&self) -> bool {
        !self.content.is_empty() || self.is_error
    }
}
