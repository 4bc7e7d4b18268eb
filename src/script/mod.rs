//! Embedded scripts
//!
//! Scripts inside injected markup never run on their own. Activation pulls
//! them out as [`EmbeddedScript`] descriptors and re-creates each one as a
//! fresh [`ScriptNode`] appended to the document body.
//!
//! ## Ordering
//!
//! Nodes are created strictly in document order. External nodes are marked
//! `async_load = false` so that, although their bodies may be downloaded in
//! parallel, they execute in insertion order relative to the rest of the
//! batch.

mod extract;

pub use extract::extract_scripts;

use serde::Serialize;

/// A script element found in fragment markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddedScript {
    /// `<script src="...">`
    External { src: String },
    /// `<script>...</script>` with its text content
    Inline { code: String },
}

/// A live script node, as appended to the document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptNode {
    /// Source reference for external scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Script text for inline scripts (empty for external ones)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Whether the node may execute out of insertion order
    pub async_load: bool,
}

impl ScriptNode {
    /// External node that executes in insertion order
    pub fn external(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            text: String::new(),
            async_load: false,
        }
    }

    /// Inline node carrying `text` verbatim
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            src: None,
            text: text.into(),
            async_load: false,
        }
    }

    pub fn is_external(&self) -> bool {
        self.src.is_some()
    }

    /// True when this node cannot overtake nodes appended before it
    pub fn preserves_order(&self) -> bool {
        !self.async_load
    }
}

impl From<EmbeddedScript> for ScriptNode {
    fn from(script: EmbeddedScript) -> Self {
        match script {
            EmbeddedScript::External { src } => ScriptNode::external(src),
            EmbeddedScript::Inline { code } => ScriptNode::inline(code),
        }
    }
}
