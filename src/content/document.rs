//! Compiled document model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of compiled content, keyed by a unique slug.
///
/// Documents are produced by the compile step and are immutable at runtime;
/// the serving path only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// URL-safe unique identifier (derived from the source filename)
    pub slug: String,

    /// Document title
    pub title: String,

    /// Short description for listings and meta tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Authoring date from front-matter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Local>>,

    /// Source file path (relative to the source directory)
    #[serde(default)]
    pub source: String,

    /// Compiled body payload
    pub body: CompiledBody,

    /// Passthrough front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The compiled representation of a document body.
///
/// `code` holds a serialized node stream; only the renderer interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledBody {
    pub code: String,
}

impl CompiledBody {
    /// Deserialize the node stream
    pub fn nodes(&self) -> Result<Vec<Node>, serde_json::Error> {
        serde_json::from_str(&self.code)
    }
}

/// One block-level node of a compiled body.
///
/// `kind` selects the builder in the renderer's mapping table; the remaining
/// fields are the payload that builder consumes. Kinds not known to a
/// renderer must still deserialize, so everything but `kind` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: String,

    /// Pre-rendered inner HTML for container kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Plain-text content (headings, fallback payloads)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Heading level, 1..=6
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// Anchor id for headings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Language token for code blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Node {
    /// Create a node of the given kind with no payload
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            html: None,
            text: None,
            level: None,
            id: None,
            lang: None,
        }
    }

    /// Create a container node holding pre-rendered HTML
    pub fn with_html(kind: &str, html: String) -> Self {
        Self {
            html: Some(html),
            ..Self::new(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_round_trip() {
        let doc = Document {
            slug: "next.js-more-docker".to_string(),
            title: "Next.js and Docker".to_string(),
            description: Some("Containerizing a Next.js app".to_string()),
            date: None,
            source: "next.js-more-docker.mdx".to_string(),
            body: CompiledBody {
                code: r#"[{"kind":"paragraph","html":"<p>hi</p>"}]"#.to_string(),
            },
            extra: HashMap::new(),
        };

        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.slug, "next.js-more-docker");
        assert_eq!(back.body.nodes().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_kind_still_deserializes() {
        let code = r#"[{"kind":"callout","text":"careful now"}]"#;
        let body = CompiledBody {
            code: code.to_string(),
        };
        let nodes = body.nodes().unwrap();
        assert_eq!(nodes[0].kind, "callout");
        assert_eq!(nodes[0].text.as_deref(), Some("careful now"));
    }
}
