//! Preconditions for word-level editing.
//!
//! A paragraph qualifies only when every child is a plain run. Anything else
//! sends the edit down the whole-span path, which [`crate::apply`] widens to
//! cover entire wrappers.

use crate::document::{Node, NodeKind, Paragraph};
use std::fmt;

/// Why minimal (word-level) editing was refused for a span.
///
/// A fallback is an expected outcome: the caller replaces the whole span with
/// one deletion and one insertion instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The paragraph already carries unresolved tracked changes.
    ExistingRevisions { kind: NodeKind },
    /// A construct that breaks the visible-text to run mapping.
    UnsupportedConstruct { kind: NodeKind },
    /// Runs nested below the paragraph inside another wrapper.
    NonDirectRuns { kind: NodeKind },
    /// The diff is too fragmented to be readable.
    TooManyHunks { count: usize, max: usize },
    /// Minimal editing switched off by configuration.
    Disabled,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ExistingRevisions { kind } => {
                write!(f, "paragraph already contains a {kind}")
            }
            FallbackReason::UnsupportedConstruct { kind } => {
                write!(f, "paragraph contains an unsupported {kind}")
            }
            FallbackReason::NonDirectRuns { kind } => {
                write!(f, "paragraph has runs nested inside a {kind}")
            }
            FallbackReason::TooManyHunks { count, max } => {
                write!(f, "too many hunks: {count} exceeds limit of {max}")
            }
            FallbackReason::Disabled => write!(f, "minimal editing disabled"),
        }
    }
}

/// Check that a paragraph can take word-level tracked changes.
///
/// Every direct child must be a plain run; anything else either already holds
/// pending revisions or hides characters from the run index.
pub fn check_paragraph(paragraph: &Paragraph) -> Result<(), FallbackReason> {
    for node in &paragraph.children {
        check_node(node)?;
    }
    Ok(())
}

fn check_node(node: &Node) -> Result<(), FallbackReason> {
    let kind = node.kind();
    match node {
        Node::Run(_) => Ok(()),
        Node::Insertion(_) | Node::Deletion(_) | Node::MoveFrom(_) | Node::MoveTo(_) => {
            Err(FallbackReason::ExistingRevisions { kind })
        }
        Node::Field(_)
        | Node::Hyperlink(_)
        | Node::ContentControl(_)
        | Node::CustomXml(_)
        | Node::SmartTag(_) => Err(FallbackReason::UnsupportedConstruct { kind }),
        Node::Group(group) if group.runs.is_empty() => Ok(()),
        Node::Group(_) => Err(FallbackReason::NonDirectRuns { kind }),
    }
}
