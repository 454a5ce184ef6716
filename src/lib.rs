//! Revision Patcher: tracked-change editing for run-structured documents
//!
//! Replaces text inside paragraphs whose visible text is split across
//! formatted runs, recording the change as tracked deletions and insertions
//! that touch only the words that actually changed.
//!
//! # Architecture
//!
//! Every edit compiles down to a list of [`EditHunk`]s: character ranges of
//! the paragraph's visible text paired with the text to delete and insert.
//! Intelligence lives in producing hunks ([`TextLocator`] finds the span,
//! [`diff()`] aligns tokens), not in applying them.
//!
//! # Safety
//!
//! - Every hunk is validated against the paragraph before anything mutates
//! - Paragraphs with pending revisions, field codes, hyperlinks, content
//!   controls or nested runs fall back to whole-span replacement
//! - Ambiguous targets are refused, never guessed
//! - Re-running an edit whose result is already present is a no-op
//!
//! # Example
//!
//! ```
//! use revision_patcher::{Document, EditOptions, RedlineEditor, RevisionFactory, Target};
//!
//! let mut doc = Document::from_plain_text("Payment is due within 30 days.");
//! let factory = RevisionFactory::for_document(&doc);
//! let mut editor = RedlineEditor::new(EditOptions::default(), factory);
//!
//! let outcome = editor
//!     .replace(&mut doc, &Target::literal("30 days"), "45 days")
//!     .unwrap();
//! println!("{outcome}");
//! assert_eq!(doc.paragraphs[0].accepted_text(), "Payment is due within 45 days.");
//! ```

pub mod apply;
pub mod charmap;
pub mod config;
pub mod diff;
pub mod document;
pub mod edit;
pub mod locate;
pub mod safety;
pub mod store;
pub mod tokenize;

// Re-exports
pub use apply::{ApplyError, ApplyReport};
pub use charmap::{CharPosition, RunCharacterMap};
pub use config::{apply_script, load_from_path, load_from_str, ConfigError, EditScript};
pub use diff::{diff, EditHunk, HunkKind, MinimalDiff, DEFAULT_MAX_HUNKS};
pub use document::{
    ChangeIdCounter, Document, Node, Paragraph, ParagraphId, Revision, RevisionFactory, Run,
    RunProperties, TrackedChangeFactory,
};
pub use edit::{EditError, EditOptions, EditOutcome, EditRequest, RedlineEditor, Target};
pub use locate::{LocateError, Query, Scope, TextLocator, TextSpan};
pub use safety::{check_paragraph, FallbackReason};
pub use store::{load_document, save_document, StoreError};
pub use tokenize::{tokenize, Token, TokenKind};
