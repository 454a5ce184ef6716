//! Tracked-change editing: locate, vet, diff, apply.
//!
//! [`RedlineEditor`] is the entry point most callers want. Every request runs
//! search, safety checks and diffing to completion before the document is
//! touched, so an error never leaves a half-edited paragraph behind.

use crate::apply::{self, ApplyError, ApplyReport};
use crate::diff::{diff, EditHunk, MinimalDiff, DEFAULT_MAX_HUNKS};
use crate::document::{Document, ParagraphId, TrackedChangeFactory};
use crate::locate::{LocateError, LocatorOptions, Query, Scope, TextLocator, TextSpan};
use crate::safety::{check_paragraph, FallbackReason};
use std::fmt;
use thiserror::Error;

/// Author stamped on revisions when none is configured.
pub const DEFAULT_AUTHOR: &str = "revision-patcher";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOptions {
    /// Hunk ceiling before falling back to whole-span replacement
    pub max_hunks: usize,
    pub normalize_quotes: bool,
    pub author: String,
    /// Word-level edits; `false` always replaces the whole span
    pub minimal: bool,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            max_hunks: DEFAULT_MAX_HUNKS,
            normalize_quotes: true,
            author: DEFAULT_AUTHOR.to_string(),
            minimal: true,
        }
    }
}

/// A search target: what to look for and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub query: Query,
    pub scope: Scope,
}

impl Target {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            query: Query::literal(text),
            scope: Scope::All,
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            query: Query::pattern(pattern),
            scope: Scope::All,
        }
    }

    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    Replace { target: Target, replacement: String },
    Delete { target: Target },
    InsertAfter { anchor: Target, text: String },
    InsertBefore { anchor: Target, text: String },
}

/// What an edit did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditOutcome should be checked for fallback/no-op results"]
pub enum EditOutcome {
    /// Word-level tracked changes were applied
    Minimal {
        paragraph: ParagraphId,
        report: ApplyReport,
    },
    /// The whole span was replaced with one deletion and one insertion
    Coarse {
        paragraph: ParagraphId,
        reason: FallbackReason,
        report: ApplyReport,
    },
    /// Text was inserted next to an anchor
    Inserted {
        paragraph: ParagraphId,
        report: ApplyReport,
    },
    /// Replacement differs only by whitespace reflow (or not at all)
    Unchanged { paragraph: ParagraphId },
    /// Target is gone but the desired text is already present
    AlreadyApplied,
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOutcome::Minimal { paragraph, report } => write!(
                f,
                "applied {} hunk(s) in {paragraph}",
                report.hunks
            ),
            EditOutcome::Coarse {
                paragraph, reason, ..
            } => write!(f, "replaced whole span in {paragraph} ({reason})"),
            EditOutcome::Inserted { paragraph, .. } => write!(f, "inserted text in {paragraph}"),
            EditOutcome::Unchanged { paragraph } => write!(f, "no visible change in {paragraph}"),
            EditOutcome::AlreadyApplied => write!(f, "already applied"),
        }
    }
}

impl EditOutcome {
    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            EditOutcome::Minimal { report, .. }
            | EditOutcome::Coarse { report, .. }
            | EditOutcome::Inserted { report, .. } => Some(report),
            EditOutcome::Unchanged { .. } | EditOutcome::AlreadyApplied => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, EditOutcome::Coarse { .. })
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("failed to apply tracked changes: {0}")]
    Apply(#[from] ApplyError),

    #[error("nothing to insert")]
    EmptyInsertion,
}

/// Applies edit requests to a document as tracked changes.
#[derive(Debug)]
pub struct RedlineEditor<F> {
    options: EditOptions,
    locator: TextLocator,
    factory: F,
}

impl<F: TrackedChangeFactory> RedlineEditor<F> {
    pub fn new(options: EditOptions, factory: F) -> Self {
        let locator = TextLocator::new(LocatorOptions {
            normalize_quotes: options.normalize_quotes,
        });
        Self {
            options,
            locator,
            factory,
        }
    }

    pub fn options(&self) -> &EditOptions {
        &self.options
    }

    pub fn locator(&self) -> &TextLocator {
        &self.locator
    }

    /// Hand back the factory, e.g. to continue its change-id sequence.
    pub fn into_factory(self) -> F {
        self.factory
    }

    pub fn apply_request(
        &mut self,
        document: &mut Document,
        request: &EditRequest,
    ) -> Result<EditOutcome, EditError> {
        match request {
            EditRequest::Replace {
                target,
                replacement,
            } => self.replace(document, target, replacement),
            EditRequest::Delete { target } => self.delete(document, target),
            EditRequest::InsertAfter { anchor, text } => {
                self.insert_at(document, anchor, text, Side::After)
            }
            EditRequest::InsertBefore { anchor, text } => {
                self.insert_at(document, anchor, text, Side::Before)
            }
        }
    }

    /// Replace the unique match of `target` with `replacement`.
    pub fn replace(
        &mut self,
        document: &mut Document,
        target: &Target,
        replacement: &str,
    ) -> Result<EditOutcome, EditError> {
        let span = match self.locator.find_unique(document, &target.query, &target.scope) {
            Ok(span) => span,
            Err(LocateError::NotFound { needle }) => {
                return self.check_already_applied(document, target, replacement, needle);
            }
            Err(err) => return Err(err.into()),
        };
        let plan = self.plan(document, &span, replacement);
        self.execute(document, &span, plan)
    }

    /// Delete the unique match of `target`.
    pub fn delete(
        &mut self,
        document: &mut Document,
        target: &Target,
    ) -> Result<EditOutcome, EditError> {
        let span = self
            .locator
            .find_unique(document, &target.query, &target.scope)?;
        let plan = self.plan(document, &span, "");
        self.execute(document, &span, plan)
    }

    pub fn insert_after(
        &mut self,
        document: &mut Document,
        anchor: &Target,
        text: &str,
    ) -> Result<EditOutcome, EditError> {
        self.insert_at(document, anchor, text, Side::After)
    }

    pub fn insert_before(
        &mut self,
        document: &mut Document,
        anchor: &Target,
        text: &str,
    ) -> Result<EditOutcome, EditError> {
        self.insert_at(document, anchor, text, Side::Before)
    }

    fn insert_at(
        &mut self,
        document: &mut Document,
        anchor: &Target,
        text: &str,
        side: Side,
    ) -> Result<EditOutcome, EditError> {
        if text.is_empty() {
            return Err(EditError::EmptyInsertion);
        }
        let span = self
            .locator
            .find_unique(document, &anchor.query, &anchor.scope)?;

        let at = match side {
            Side::After => span.chars.end,
            Side::Before => span.chars.start,
        };
        let hunk = EditHunk::insertion(text, at);
        let report = self.apply_hunks(document, span.paragraph, &[hunk])?;
        Ok(EditOutcome::Inserted {
            paragraph: span.paragraph,
            report,
        })
    }

    /// Decide between minimal hunks, coarse replacement, or nothing.
    fn plan(&self, document: &Document, span: &TextSpan, replacement: &str) -> Plan {
        if span.text == replacement {
            return Plan::Nothing;
        }
        let coarse = |reason: FallbackReason| {
            tracing::warn!(
                paragraph = span.paragraph.0,
                %reason,
                "falling back to whole-span replacement"
            );
            Plan::Coarse(
                EditHunk::whole_span(span.text.clone(), replacement, span.chars.clone()),
                reason,
            )
        };

        if !self.options.minimal {
            return coarse(FallbackReason::Disabled);
        }
        if let Some(paragraph) = document.paragraph(span.paragraph) {
            if let Err(reason) = check_paragraph(paragraph) {
                return coarse(reason);
            }
        }
        match diff(&span.text, replacement, self.options.max_hunks) {
            MinimalDiff::Changes(mut hunks) => {
                for hunk in &mut hunks {
                    hunk.rebase(span.chars.start);
                }
                Plan::Minimal(hunks)
            }
            MinimalDiff::Unchanged => Plan::Nothing,
            MinimalDiff::Fallback(reason) => coarse(reason),
        }
    }

    fn execute(
        &mut self,
        document: &mut Document,
        span: &TextSpan,
        plan: Plan,
    ) -> Result<EditOutcome, EditError> {
        let paragraph = span.paragraph;
        match plan {
            Plan::Nothing => Ok(EditOutcome::Unchanged { paragraph }),
            Plan::Minimal(hunks) => {
                let report = self.apply_hunks(document, paragraph, &hunks)?;
                Ok(EditOutcome::Minimal { paragraph, report })
            }
            Plan::Coarse(hunk, reason) => {
                let report = self.apply_hunks(document, paragraph, &[hunk])?;
                Ok(EditOutcome::Coarse {
                    paragraph,
                    reason,
                    report,
                })
            }
        }
    }

    fn apply_hunks(
        &mut self,
        document: &mut Document,
        id: ParagraphId,
        hunks: &[EditHunk],
    ) -> Result<ApplyReport, EditError> {
        let count = document.len();
        let paragraph = document
            .paragraph_mut(id)
            .ok_or(LocateError::UnknownParagraph { id, count })?;
        Ok(apply::apply(
            paragraph,
            hunks,
            &mut self.factory,
            &self.options.author,
        )?)
    }

    /// A missing target is fine when the replacement already reads exactly
    /// once in the scope. Visible text includes pending insertions, so this
    /// sees the text as it reads with every change accepted.
    fn check_already_applied(
        &self,
        document: &Document,
        target: &Target,
        replacement: &str,
        needle: String,
    ) -> Result<EditOutcome, EditError> {
        if matches!(target.query, Query::Literal(_)) && !replacement.is_empty() {
            let query = Query::literal(replacement);
            if self.locator.find(document, &query, &target.scope)?.len() == 1 {
                tracing::debug!(needle = %needle, "replacement already present");
                return Ok(EditOutcome::AlreadyApplied);
            }
        }
        Err(LocateError::NotFound { needle }.into())
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Before,
    After,
}

#[derive(Debug)]
enum Plan {
    Nothing,
    Minimal(Vec<EditHunk>),
    Coarse(EditHunk, FallbackReason),
}
