//! Word-level minimal diff between an original phrase and its replacement.
//!
//! The diff is computed on [`tokenize`](crate::tokenize::tokenize) output with
//! an LCS alignment, then filtered so that pure whitespace reflow stays
//! invisible while spacing changes next to real edits still surface.

use crate::safety::FallbackReason;
use crate::tokenize::{tokenize, Token, TokenKind};
use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::ops::Range;

/// Hunk ceiling used when the caller does not configure one.
pub const DEFAULT_MAX_HUNKS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HunkKind {
    /// Touches at least one word
    Content,
    /// Only whitespace on both sides
    WhitespaceOnly,
    /// Only whitespace and punctuation, with at least one punctuation mark
    PunctuationOnly,
}

/// One delete/insert/replace operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHunk {
    /// Token range in the original
    pub tokens: Range<usize>,
    pub delete_text: String,
    pub insert_text: String,
    pub kind: HunkKind,
    /// Whitespace hunk sitting right next to a non-whitespace change
    pub adjacent_to_change: bool,
    /// Character range in the original text (or in the paragraph, once rebased)
    pub chars: Range<usize>,
}

impl EditHunk {
    /// Whole-span replacement used for coarse fallback.
    pub fn whole_span(
        original: impl Into<String>,
        replacement: impl Into<String>,
        chars: Range<usize>,
    ) -> Self {
        Self {
            tokens: 0..0,
            delete_text: original.into(),
            insert_text: replacement.into(),
            kind: HunkKind::Content,
            adjacent_to_change: false,
            chars,
        }
    }

    /// Zero-width insertion at `at`.
    pub fn insertion(text: impl Into<String>, at: usize) -> Self {
        Self {
            tokens: 0..0,
            delete_text: String::new(),
            insert_text: text.into(),
            kind: HunkKind::Content,
            adjacent_to_change: false,
            chars: at..at,
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.delete_text.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.insert_text.is_empty()
    }

    /// Shift the character range by `offset`, e.g. from span-relative to
    /// paragraph-relative positions.
    pub fn rebase(&mut self, offset: usize) {
        self.chars = self.chars.start + offset..self.chars.end + offset;
    }
}

/// Outcome of [`diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimalDiff {
    /// Non-empty, ordered, non-overlapping hunks
    Changes(Vec<EditHunk>),
    /// Nothing visible to change (identical or whitespace reflow only)
    Unchanged,
    /// Minimal editing would be unreadable; replace the span wholesale
    Fallback(FallbackReason),
}

impl MinimalDiff {
    pub fn hunks(&self) -> &[EditHunk] {
        match self {
            MinimalDiff::Changes(hunks) => hunks,
            MinimalDiff::Unchanged | MinimalDiff::Fallback(_) => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MinimalDiff::Fallback(_))
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            MinimalDiff::Fallback(reason) => Some(reason),
            _ => None,
        }
    }
}

/// One entry of the alignment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Equal,
    Change { old: Range<usize>, new: Range<usize> },
}

/// Compute hunks turning `original` into `new_text`.
pub fn diff(original: &str, new_text: &str, max_hunks: usize) -> MinimalDiff {
    let old = tokenize(original);
    let new = tokenize(new_text);
    let steps = align(&old, &new);

    let kinds: Vec<Option<HunkKind>> = steps
        .iter()
        .map(|step| match step {
            Step::Equal => None,
            Step::Change { old: o, new: n } => Some(classify(&old[o.clone()], &new[n.clone()])),
        })
        .collect();

    let is_real_change = |idx: Option<usize>| {
        idx.and_then(|i| kinds.get(i).copied().flatten())
            .is_some_and(|k| k != HunkKind::WhitespaceOnly)
    };

    let mut hunks = Vec::new();
    for (idx, step) in steps.iter().enumerate() {
        let (Step::Change { old: o, new: n }, Some(kind)) = (step, kinds[idx]) else {
            continue;
        };
        let adjacent = kind == HunkKind::WhitespaceOnly
            && (is_real_change(idx.checked_sub(1)) || is_real_change(Some(idx + 1)));
        if kind == HunkKind::WhitespaceOnly && !adjacent {
            tracing::trace!(tokens = ?o, "suppressed whitespace-only hunk");
            continue;
        }
        hunks.push(EditHunk {
            tokens: o.clone(),
            delete_text: concat(&old[o.clone()]),
            insert_text: concat(&new[n.clone()]),
            kind,
            adjacent_to_change: adjacent,
            chars: 0..0,
        });
    }

    if hunks.len() > max_hunks {
        return MinimalDiff::Fallback(FallbackReason::TooManyHunks {
            count: hunks.len(),
            max: max_hunks,
        });
    }
    if hunks.is_empty() {
        return MinimalDiff::Unchanged;
    }

    let mut prefix = Vec::with_capacity(old.len() + 1);
    prefix.push(0);
    for token in &old {
        let last = prefix.last().copied().unwrap_or(0);
        prefix.push(last + token.char_len());
    }
    for hunk in &mut hunks {
        hunk.chars = prefix[hunk.tokens.start]..prefix[hunk.tokens.end];
    }
    MinimalDiff::Changes(hunks)
}

/// LCS alignment, with touching changes merged and whitespace at the edges
/// of a replacement split into its own step.
fn align(old: &[Token], new: &[Token]) -> Vec<Step> {
    let old_keys: Vec<&str> = old.iter().map(|t| t.text.as_str()).collect();
    let new_keys: Vec<&str> = new.iter().map(|t| t.text.as_str()).collect();

    let mut merged: Vec<Step> = Vec::new();
    for op in capture_diff_slices(Algorithm::Lcs, &old_keys, &new_keys) {
        let (tag, o, n) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            merged.push(Step::Equal);
            continue;
        }
        if let Some(Step::Change { old: po, new: pn }) = merged.last_mut() {
            po.end = o.end;
            pn.end = n.end;
            continue;
        }
        merged.push(Step::Change { old: o, new: n });
    }

    let mut steps = Vec::with_capacity(merged.len());
    for step in merged {
        match step {
            Step::Change { old: o, new: n } => peel_whitespace(old, new, o, n, &mut steps),
            Step::Equal => steps.push(Step::Equal),
        }
    }
    steps
}

/// Split leading/trailing whitespace off a two-sided change, so that e.g.
/// `"aX  "` → `"aY "` becomes a word change plus a spacing change.
fn peel_whitespace(
    old: &[Token],
    new: &[Token],
    mut o: Range<usize>,
    mut n: Range<usize>,
    out: &mut Vec<Step>,
) {
    let ws = |tokens: &[Token], idx: usize| tokens[idx].kind == TokenKind::Whitespace;
    let mut head = None;
    let mut tail = None;

    if !o.is_empty()
        && !n.is_empty()
        && (o.len() > 1 || n.len() > 1)
        && ws(old, o.start)
        && ws(new, n.start)
    {
        head = Some((o.start..o.start + 1, n.start..n.start + 1));
        o.start += 1;
        n.start += 1;
    }
    // The old side must keep a token, otherwise the remaining insertion would
    // start at the same character as the peeled tail.
    if o.len() > 1 && !n.is_empty() && ws(old, o.end - 1) && ws(new, n.end - 1) {
        tail = Some((o.end - 1..o.end, n.end - 1..n.end));
        o.end -= 1;
        n.end -= 1;
    }

    let mut emit = |o: Range<usize>, n: Range<usize>| {
        if concat(&old[o.clone()]) == concat(&new[n.clone()]) {
            out.push(Step::Equal);
        } else {
            out.push(Step::Change { old: o, new: n });
        }
    };
    if let Some((ho, hn)) = head {
        emit(ho, hn);
    }
    emit(o, n);
    if let Some((to, tn)) = tail {
        emit(to, tn);
    }
}

fn classify(deleted: &[Token], inserted: &[Token]) -> HunkKind {
    let all = || deleted.iter().chain(inserted.iter());
    if all().all(Token::is_whitespace) {
        HunkKind::WhitespaceOnly
    } else if all().all(|t| !t.is_word()) && all().any(Token::is_punctuation) {
        HunkKind::PunctuationOnly
    } else {
        HunkKind::Content
    }
}

fn concat(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Apply hunks to plain text, left to right. Hunk ranges refer to `original`.
pub fn patch_text(original: &str, hunks: &[EditHunk]) -> String {
    let chars: Vec<char> = original.chars().collect();
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for hunk in hunks {
        let start = hunk.chars.start.min(chars.len());
        out.extend(&chars[cursor.min(start)..start]);
        out.push_str(&hunk.insert_text);
        cursor = hunk.chars.end.min(chars.len()).max(start);
    }
    out.extend(&chars[cursor.min(chars.len())..]);
    out
}
