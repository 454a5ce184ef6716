//! In-memory document tree: paragraphs made of formatted runs.
//!
//! The tree is deliberately shallow. A [`Paragraph`] owns an ordered list of
//! [`Node`]s; plain text lives in [`Run`]s that are direct children of the
//! paragraph, everything else (tracked changes, fields, hyperlinks, content
//! controls) is a wrapper node holding its own runs.
//!
//! Runs are addressed by *fragment index*: the ordinal of a direct-child run
//! among the paragraph's direct runs. Child positions shift whenever nodes are
//! spliced in, so callers re-derive positions through
//! [`RunCharacterMap`](crate::charmap::RunCharacterMap) instead of caching them.

pub mod revision;

pub use revision::{
    ChangeIdCounter, Clock, FixedClock, Revision, RevisionFactory, SystemClock,
    TrackedChangeFactory,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character formatting attached to a run.
///
/// `Clone` is a deep copy; runs carved out of an existing run always receive
/// their own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunProperties {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    /// Underline style (`single`, `double`, ...)
    pub underline: Option<String>,
    pub font: Option<String>,
    /// Font size in half-points
    pub size: Option<u32>,
    /// Hex RGB color without leading `#`
    pub color: Option<String>,
    pub highlight: Option<String>,
    /// Character style id
    pub style: Option<String>,
}

impl RunProperties {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }
}

/// A contiguous span of text sharing one formatting record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub properties: RunProperties,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            properties: RunProperties::default(),
        }
    }

    pub fn with_properties(text: impl Into<String>, properties: RunProperties) -> Self {
        Self {
            text: text.into(),
            properties,
        }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split at a character offset. Both halves keep a copy of the properties.
    pub fn split_at(&self, offset: usize) -> (Run, Run) {
        let at = byte_offset(&self.text, offset);
        (
            Run::with_properties(&self.text[..at], self.properties.clone()),
            Run::with_properties(&self.text[at..], self.properties.clone()),
        )
    }

    /// Copy of the characters in `[start, end)`, with the same properties.
    pub fn slice(&self, start: usize, end: usize) -> Run {
        let from = byte_offset(&self.text, start);
        let to = byte_offset(&self.text, end);
        Run::with_properties(&self.text[from..to], self.properties.clone())
    }
}

/// Convert a character offset into a byte offset, clamping at the end.
pub(crate) fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// A field (`PAGE`, `MERGEFIELD`, ...) with its cached result runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCode {
    pub instruction: String,
    #[serde(default)]
    pub result: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub target: String,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// Generic wrapper element around runs (content controls, custom XML, smart
/// tags, bidi overrides).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// A direct child of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Run(Run),
    Insertion(Revision),
    Deletion(Revision),
    MoveFrom(Revision),
    MoveTo(Revision),
    Field(FieldCode),
    Hyperlink(Hyperlink),
    ContentControl(Container),
    CustomXml(Container),
    SmartTag(Container),
    /// Any other wrapper that holds runs; its runs are not direct children.
    Group(Container),
}

/// Discriminant of [`Node`], used in reports and fallback reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Run,
    Insertion,
    Deletion,
    MoveFrom,
    MoveTo,
    Field,
    Hyperlink,
    ContentControl,
    CustomXml,
    SmartTag,
    Group,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Run => "run",
            NodeKind::Insertion => "tracked insertion",
            NodeKind::Deletion => "tracked deletion",
            NodeKind::MoveFrom => "tracked move (source)",
            NodeKind::MoveTo => "tracked move (destination)",
            NodeKind::Field => "field code",
            NodeKind::Hyperlink => "hyperlink",
            NodeKind::ContentControl => "structured content control",
            NodeKind::CustomXml => "custom XML markup",
            NodeKind::SmartTag => "smart tag",
            NodeKind::Group => "wrapper element",
        };
        f.write_str(name)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Run(_) => NodeKind::Run,
            Node::Insertion(_) => NodeKind::Insertion,
            Node::Deletion(_) => NodeKind::Deletion,
            Node::MoveFrom(_) => NodeKind::MoveFrom,
            Node::MoveTo(_) => NodeKind::MoveTo,
            Node::Field(_) => NodeKind::Field,
            Node::Hyperlink(_) => NodeKind::Hyperlink,
            Node::ContentControl(_) => NodeKind::ContentControl,
            Node::CustomXml(_) => NodeKind::CustomXml,
            Node::SmartTag(_) => NodeKind::SmartTag,
            Node::Group(_) => NodeKind::Group,
        }
    }

    pub fn as_run(&self) -> Option<&Run> {
        match self {
            Node::Run(run) => Some(run),
            _ => None,
        }
    }

    /// Runs owned by this node, including the node itself for a plain run.
    pub fn runs(&self) -> &[Run] {
        match self {
            Node::Run(run) => std::slice::from_ref(run),
            Node::Insertion(rev) | Node::Deletion(rev) | Node::MoveFrom(rev) | Node::MoveTo(rev) => {
                &rev.runs
            }
            Node::Field(field) => &field.result,
            Node::Hyperlink(link) => &link.runs,
            Node::ContentControl(c) | Node::CustomXml(c) | Node::SmartTag(c) | Node::Group(c) => {
                &c.runs
            }
        }
    }

    /// True for tracked-change wrappers of any flavor.
    pub fn is_revision(&self) -> bool {
        matches!(
            self,
            Node::Insertion(_) | Node::Deletion(_) | Node::MoveFrom(_) | Node::MoveTo(_)
        )
    }

    fn text_into(&self, out: &mut String) {
        for run in self.runs() {
            out.push_str(&run.text);
        }
    }
}

/// Index of a paragraph within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParagraphId(pub usize);

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "paragraph {}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph made only of direct runs.
    pub fn from_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        Self {
            style: None,
            children: runs.into_iter().map(Node::Run).collect(),
        }
    }

    /// Single unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_runs([Run::new(text)])
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Direct-child runs in order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(Node::as_run)
    }

    /// Visible text: every run outside deletions and move sources, wrapped or
    /// not. This is also the text with every tracked change accepted.
    pub fn text(&self) -> String {
        self.accepted_text()
    }

    /// Text as it would read with every tracked change accepted.
    pub fn accepted_text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if !matches!(node, Node::Deletion(_) | Node::MoveFrom(_)) {
                node.text_into(&mut out);
            }
        }
        out
    }

    /// Text as it would read with every tracked change rejected.
    pub fn rejected_text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if !matches!(node, Node::Insertion(_) | Node::MoveTo(_)) {
                node.text_into(&mut out);
            }
        }
        out
    }

    pub fn revisions(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|node| node.is_revision())
    }

    pub fn has_revisions(&self) -> bool {
        self.children.iter().any(Node::is_revision)
    }
}

/// Ordered collection of paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// Build a document with one plain paragraph per line.
    pub fn from_plain_text(text: &str) -> Self {
        Self::new(text.lines().map(Paragraph::plain).collect())
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.paragraphs.get(id.0)
    }

    pub fn paragraph_mut(&mut self, id: ParagraphId) -> Option<&mut Paragraph> {
        self.paragraphs.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParagraphId, &Paragraph)> {
        self.paragraphs
            .iter()
            .enumerate()
            .map(|(idx, p)| (ParagraphId(idx), p))
    }

    /// Count of tracked-change wrappers across all paragraphs.
    pub fn revision_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.revisions().count()).sum()
    }
}
