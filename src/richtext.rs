//! richtext: in-memory model of blocks and their rich-text runs.
//!
//! A block's text is an ordered sequence of runs. Only `Run::Text` carries matchable
//! plain text; references and foreign runs are carried through verbatim.
//!
//! Block kinds:
//! - paragraph-like kinds (see `BlockKind::is_textual`) are matched and rewritten;
//! - everything else is `BlockKind::Other` and is only traversed for children.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Formatting attributes of a run. Field names follow the Notion wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "default".to_string()
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
        }
    }
}

/// Plain text run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub content: String,
    pub link: Option<String>,
    pub annotations: Annotations,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            link: None,
            annotations: Annotations::default(),
        }
    }

    /// Same attributes, different text.
    pub fn with_content(&self, content: &str) -> Self {
        Self {
            content: content.to_string(),
            link: self.link.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

/// Target of a native reference.
#[derive(Clone, Debug, PartialEq)]
pub enum RefTarget {
    /// Freshly produced from a `[[category]]` span; the store resolves it on write.
    Category(String),
    /// Existing page mention.
    Page { id: String },
    /// Any other existing mention (user, date, database ...), kept as-is.
    Raw(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub target: RefTarget,
    pub plain_text: String,
    pub annotations: Annotations,
}

impl Reference {
    pub fn category(name: impl Into<String>, annotations: Annotations) -> Self {
        let name = name.into();
        Self {
            plain_text: name.clone(),
            target: RefTarget::Category(name),
            annotations,
        }
    }
}

/// One rich-text run.
#[derive(Clone, Debug, PartialEq)]
pub enum Run {
    Text(TextRun),
    Reference(Reference),
    /// Equations and anything this tool does not model.
    Other(Value),
}

impl Run {
    pub fn text(content: impl Into<String>) -> Self {
        Run::Text(TextRun::plain(content))
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Run::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Category of a freshly created reference, if this is one.
    pub fn category(&self) -> Option<&str> {
        match self {
            Run::Reference(Reference {
                target: RefTarget::Category(c),
                ..
            }) => Some(c.as_str()),
            _ => None,
        }
    }
}

/// Concatenated visible text of a run sequence (debug/log output).
pub fn plain_text(runs: &[Run]) -> String {
    let mut out = String::new();
    for r in runs {
        match r {
            Run::Text(t) => out.push_str(&t.content),
            Run::Reference(rf) => {
                out.push('@');
                out.push_str(&rf.plain_text);
            }
            Run::Other(v) => {
                if let Some(s) = v.get("plain_text").and_then(Value::as_str) {
                    out.push_str(s);
                }
            }
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    BulletedListItem,
    NumberedListItem,
    Heading1,
    Heading2,
    Heading3,
    Toggle,
    Other(String),
}

impl BlockKind {
    pub fn from_type_name(s: &str) -> Self {
        match s {
            "paragraph" => BlockKind::Paragraph,
            "bulleted_list_item" => BlockKind::BulletedListItem,
            "numbered_list_item" => BlockKind::NumberedListItem,
            "heading_1" => BlockKind::Heading1,
            "heading_2" => BlockKind::Heading2,
            "heading_3" => BlockKind::Heading3,
            "toggle" => BlockKind::Toggle,
            other => BlockKind::Other(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::BulletedListItem => "bulleted_list_item",
            BlockKind::NumberedListItem => "numbered_list_item",
            BlockKind::Heading1 => "heading_1",
            BlockKind::Heading2 => "heading_2",
            BlockKind::Heading3 => "heading_3",
            BlockKind::Toggle => "toggle",
            BlockKind::Other(s) => s.as_str(),
        }
    }

    /// Kinds whose content is a plain rich_text array we know how to rewrite.
    pub fn is_textual(&self) -> bool {
        !matches!(self, BlockKind::Other(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockBody {
    Text { runs: Vec<Run>, color: Option<String> },
    /// Textual kind, but the content did not parse. Reason for logs.
    Malformed(String),
    /// Non-textual kind.
    Unsupported,
}

/// Snapshot of one block as returned by a children listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub body: BlockBody,
    pub has_children: bool,
}

impl Block {
    /// Convenience constructor for a textual block.
    pub fn text(id: impl Into<String>, kind: BlockKind, runs: Vec<Run>) -> Self {
        Self {
            id: id.into(),
            kind,
            body: BlockBody::Text { runs, color: None },
            has_children: false,
        }
    }

    pub fn runs(&self) -> Option<&[Run]> {
        match &self.body {
            BlockBody::Text { runs, .. } => Some(runs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_roundtrip() {
        for name in [
            "paragraph",
            "bulleted_list_item",
            "numbered_list_item",
            "heading_1",
            "heading_2",
            "heading_3",
            "toggle",
            "child_page",
        ] {
            assert_eq!(BlockKind::from_type_name(name).type_name(), name);
        }
        assert!(BlockKind::Toggle.is_textual());
        assert!(!BlockKind::from_type_name("image").is_textual());
    }

    #[test]
    fn plain_text_renders_references_with_at() {
        let runs = vec![
            Run::text("See "),
            Run::Reference(Reference::category("Projects", Annotations::default())),
        ];
        assert_eq!(plain_text(&runs), "See @Projects");
    }
}
