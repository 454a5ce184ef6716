//! Locate text inside paragraphs regardless of how it is split into runs.

use crate::charmap::RunCharacterMap;
use crate::document::{Document, Paragraph, ParagraphId};
use crate::tokenize::{tokenize, Token};
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Exact text (subject to quote normalization)
    Literal(String),
    /// Regular expression
    Pattern(String),
}

impl Query {
    pub fn literal(text: impl Into<String>) -> Self {
        Query::Literal(text.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Query::Pattern(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Query::Literal(text) | Query::Pattern(text) => text,
        }
    }
}

/// Which paragraphs to search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    Paragraph(ParagraphId),
    Paragraphs(Vec<ParagraphId>),
    /// Half-open range of paragraph indices
    Range(Range<usize>),
}

impl Scope {
    fn resolve(&self, document: &Document) -> Result<Vec<ParagraphId>, LocateError> {
        let check = |id: ParagraphId| {
            if id.0 < document.len() {
                Ok(id)
            } else {
                Err(LocateError::UnknownParagraph {
                    id,
                    count: document.len(),
                })
            }
        };
        match self {
            Scope::All => Ok((0..document.len()).map(ParagraphId).collect()),
            Scope::Paragraph(id) => Ok(vec![check(*id)?]),
            Scope::Paragraphs(ids) => {
                let mut ids = ids.iter().copied().map(check).collect::<Result<Vec<_>, _>>()?;
                ids.sort();
                ids.dedup();
                Ok(ids)
            }
            Scope::Range(range) => Ok((range.start..range.end.min(document.len()))
                .map(ParagraphId)
                .collect()),
        }
    }
}

/// A located match, addressed by fragment indices and offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub paragraph: ParagraphId,
    /// Fragment indices spanned, in order
    pub runs: Vec<usize>,
    /// Character offset in the first run
    pub start_offset: usize,
    /// Character offset one past the match in the last run
    pub end_offset: usize,
    pub text: String,
    /// Character range in the paragraph's visible text
    pub chars: Range<usize>,
}

impl TextSpan {
    pub fn first_run(&self) -> usize {
        self.runs.first().copied().unwrap_or(0)
    }

    pub fn last_run(&self) -> usize {
        self.runs.last().copied().unwrap_or(0)
    }

    pub fn is_split(&self) -> bool {
        self.runs.len() > 1
    }
}

#[derive(Error, Debug, Clone)]
pub enum LocateError {
    #[error("text not found: {needle:?}")]
    NotFound { needle: String },

    #[error("{needle:?} matched {} locations, expected exactly 1", candidates.len())]
    Ambiguous {
        needle: String,
        candidates: Vec<TextSpan>,
    },

    #[error("invalid search pattern {pattern:?}: {message}")]
    MalformedPattern { pattern: String, message: String },

    #[error("{id} does not exist (document has {count} paragraphs)")]
    UnknownParagraph { id: ParagraphId, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Let straight quotes in a literal match typographic quotes and back.
    pub normalize_quotes: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            normalize_quotes: true,
        }
    }
}

const SINGLE_QUOTES: &str = "['\u{2018}\u{2019}]";
const DOUBLE_QUOTES: &str = "[\"\u{201C}\u{201D}]";

/// Searches paragraphs by visible text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLocator {
    options: LocatorOptions,
}

impl TextLocator {
    pub fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> LocatorOptions {
        self.options
    }

    /// Compile a query into a regex.
    pub fn compile(&self, query: &Query) -> Result<Regex, LocateError> {
        let source = match query {
            Query::Literal(text) => self.literal_pattern(text),
            Query::Pattern(pattern) => pattern.clone(),
        };
        Regex::new(&source).map_err(|e| LocateError::MalformedPattern {
            pattern: query.as_str().to_string(),
            message: e.to_string(),
        })
    }

    fn literal_pattern(&self, text: &str) -> String {
        if !self.options.normalize_quotes {
            return regex::escape(text);
        }
        let mut out = String::with_capacity(text.len() + 8);
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            match ch {
                '\'' | '\u{2018}' | '\u{2019}' => out.push_str(SINGLE_QUOTES),
                '"' | '\u{201C}' | '\u{201D}' => out.push_str(DOUBLE_QUOTES),
                _ => out.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
            }
        }
        out
    }

    /// All non-overlapping matches in scope, in document order.
    pub fn find(
        &self,
        document: &Document,
        query: &Query,
        scope: &Scope,
    ) -> Result<Vec<TextSpan>, LocateError> {
        let regex = self.compile(query)?;
        let mut spans = Vec::new();
        for id in scope.resolve(document)? {
            if let Some(paragraph) = document.paragraph(id) {
                spans.extend(find_with(&regex, paragraph, id));
            }
        }
        tracing::debug!(needle = query.as_str(), matches = spans.len(), "located text");
        Ok(spans)
    }

    /// All matches inside one paragraph.
    pub fn find_in_paragraph(
        &self,
        paragraph: &Paragraph,
        id: ParagraphId,
        query: &Query,
    ) -> Result<Vec<TextSpan>, LocateError> {
        let regex = self.compile(query)?;
        Ok(find_with(&regex, paragraph, id))
    }

    /// Exactly one match, or `NotFound` / `Ambiguous`.
    pub fn find_unique(
        &self,
        document: &Document,
        query: &Query,
        scope: &Scope,
    ) -> Result<TextSpan, LocateError> {
        let mut spans = self.find(document, query, scope)?;
        match spans.len() {
            0 => Err(LocateError::NotFound {
                needle: query.as_str().to_string(),
            }),
            1 => Ok(spans.remove(0)),
            _ => Err(LocateError::Ambiguous {
                needle: query.as_str().to_string(),
                candidates: spans,
            }),
        }
    }
}

fn find_with(regex: &Regex, paragraph: &Paragraph, id: ParagraphId) -> Vec<TextSpan> {
    let map = RunCharacterMap::build(paragraph);
    let mut spans = Vec::new();
    let mut last_byte = 0;
    let mut last_char = 0;
    for m in regex.find_iter(map.text()) {
        if m.is_empty() {
            continue;
        }
        let start = last_char + map.text()[last_byte..m.start()].chars().count();
        let end = start + m.as_str().chars().count();
        last_byte = m.end();
        last_char = end;

        let Some(cov) = map.coverage(start..end) else {
            continue;
        };
        spans.push(TextSpan {
            paragraph: id,
            runs: (cov.first_run..=cov.last_run).collect(),
            start_offset: cov.start_offset,
            end_offset: cov.end_offset,
            text: m.as_str().to_string(),
            chars: start..end,
        });
    }
    spans
}

/// Best fuzzy match for a needle that was not found verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestMatch {
    pub paragraph: ParagraphId,
    pub text: String,
    /// Normalized Levenshtein similarity in `[0, 1]`
    pub score: f64,
}

/// Find the window of paragraph text most similar to `needle`.
///
/// Windows are aligned to tokens and span as many tokens as the needle, so
/// the suggestion reads as a phrase rather than a fragment.
pub fn closest_match(document: &Document, needle: &str, min_score: f64) -> Option<ClosestMatch> {
    let width = tokenize(needle).len();
    if width == 0 {
        return None;
    }
    let mut best: Option<ClosestMatch> = None;
    for (id, paragraph) in document.iter() {
        let tokens = tokenize(&paragraph.text());
        for window in windows(&tokens, width) {
            let score = strsim::normalized_levenshtein(&window, needle);
            if score >= min_score && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ClosestMatch {
                    paragraph: id,
                    text: window,
                    score,
                });
            }
        }
    }
    best
}

fn windows(tokens: &[Token], width: usize) -> Vec<String> {
    if tokens.len() <= width {
        return vec![tokens.iter().map(|t| t.text.as_str()).collect()];
    }
    tokens
        .windows(width)
        .map(|w| w.iter().map(|t| t.text.as_str()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Run, RunProperties};

    fn contract() -> Document {
        Document::new(vec![
            Paragraph::from_runs([
                Run::new("The pa"),
                Run::with_properties("rty sh", RunProperties::bold()),
                Run::new("all pay"),
            ]),
            Paragraph::plain("The party\u{2019}s obligations survive."),
            Paragraph::plain("Either party may terminate."),
        ])
    }

    #[test]
    fn finds_text_split_across_runs() {
        let doc = contract();
        let locator = TextLocator::default();
        let span = locator
            .find_unique(&doc, &Query::literal("party shall"), &Scope::Paragraph(ParagraphId(0)))
            .unwrap();
        assert_eq!(span.runs, vec![0, 1, 2]);
        assert_eq!(span.start_offset, 4);
        assert_eq!(span.end_offset, 3);
        assert_eq!(span.chars, 4..15);
        assert_eq!(span.text, "party shall");
        assert!(span.is_split());
    }

    #[test]
    fn span_text_matches_run_slices() {
        let doc = contract();
        let span = TextLocator::default()
            .find_unique(&doc, &Query::literal("rty shall p"), &Scope::All)
            .unwrap();
        let para = doc.paragraph(span.paragraph).unwrap();
        let runs: Vec<&Run> = para.runs().collect();
        let mut rebuilt = String::new();
        for (i, run_idx) in span.runs.iter().enumerate() {
            let run = runs[*run_idx];
            let start = if i == 0 { span.start_offset } else { 0 };
            let end = if i + 1 == span.runs.len() {
                span.end_offset
            } else {
                run.char_len()
            };
            rebuilt.push_str(&run.slice(start, end).text);
        }
        assert_eq!(rebuilt, span.text);
    }

    #[test]
    fn straight_quote_matches_curly() {
        let doc = contract();
        let spans = TextLocator::default()
            .find(&doc, &Query::literal("party's"), &Scope::All)
            .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].paragraph, ParagraphId(1));
        assert_eq!(spans[0].text, "party\u{2019}s");

        let strict = TextLocator::new(LocatorOptions {
            normalize_quotes: false,
        });
        assert!(strict
            .find(&doc, &Query::literal("party's"), &Scope::All)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn ambiguous_and_missing() {
        let doc = contract();
        let locator = TextLocator::default();
        match locator.find_unique(&doc, &Query::literal("party"), &Scope::All) {
            Err(LocateError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates.len(), 3);
                let ids: Vec<_> = candidates.iter().map(|c| c.paragraph.0).collect();
                assert_eq!(ids, vec![0, 1, 2]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(matches!(
            locator.find_unique(&doc, &Query::literal("indemnify"), &Scope::All),
            Err(LocateError::NotFound { .. })
        ));
    }

    #[test]
    fn never_matches_across_paragraphs() {
        let doc = Document::from_plain_text("ends with party\nshall begin");
        let spans = TextLocator::default()
            .find(&doc, &Query::literal("party\nshall"), &Scope::All)
            .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn pattern_mode() {
        let doc = Document::from_plain_text("within 30 days or 60 days");
        let locator = TextLocator::default();
        let spans = locator
            .find(&doc, &Query::pattern(r"\d+ days"), &Scope::All)
            .unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].chars, 18..25);

        let err = locator
            .find(&doc, &Query::pattern("(unclosed"), &Scope::All)
            .unwrap_err();
        assert!(matches!(err, LocateError::MalformedPattern { .. }));
    }

    #[test]
    fn empty_matches_are_ignored() {
        let doc = Document::from_plain_text("abc");
        let spans = TextLocator::default()
            .find(&doc, &Query::pattern("x*"), &Scope::All)
            .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn scope_filters_paragraphs() {
        let doc = contract();
        let locator = TextLocator::default();
        let spans = locator
            .find(&doc, &Query::literal("party"), &Scope::Range(1..3))
            .unwrap();
        assert_eq!(spans.len(), 2);
        let spans = locator
            .find(
                &doc,
                &Query::literal("party"),
                &Scope::Paragraphs(vec![ParagraphId(2), ParagraphId(0)]),
            )
            .unwrap();
        assert_eq!(spans[0].paragraph, ParagraphId(0));
        assert!(matches!(
            locator.find(&doc, &Query::literal("x"), &Scope::Paragraph(ParagraphId(9))),
            Err(LocateError::UnknownParagraph { .. })
        ));
    }

    #[test]
    fn multibyte_offsets_are_characters() {
        let doc = Document::from_plain_text("Société générale paie");
        let span = TextLocator::default()
            .find_unique(&doc, &Query::literal("paie"), &Scope::All)
            .unwrap();
        assert_eq!(span.chars, 17..21);
        assert_eq!(span.start_offset, 17);
    }

    #[test]
    fn closest_match_suggests_phrase() {
        let doc = contract();
        let hit = closest_match(&doc, "Either party may terminat", 0.5).unwrap();
        assert_eq!(hit.paragraph, ParagraphId(2));
        assert!(hit.score > 0.8);
        assert!(closest_match(&doc, "zzzz qqqq", 0.9).is_none());
    }
}
