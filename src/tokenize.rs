//! Word-level tokenizer used by the diff engine.
//!
//! Tokens are words, whitespace runs, or single punctuation characters.
//! Tokenization is lossless: joining the tokens gives back the input.

use regex::Regex;
use std::sync::LazyLock;

/// Whitespace runs, then words (letters/digits joined by single internal
/// hyphens or apostrophes), then any single character.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?P<ws>\s+)|(?P<word>[\p{L}\p{N}]+(?:[-'\x{2018}\x{2019}][\p{L}\p{N}]+)*)|.")
        .expect("token pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Word,
    Whitespace,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_punctuation(&self) -> bool {
        self.kind == TokenKind::Punctuation
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let kind = if caps.name("ws").is_some() {
                TokenKind::Whitespace
            } else if caps.name("word").is_some() {
                TokenKind::Word
            } else {
                TokenKind::Punctuation
            };
            caps.get(0).map(|m| Token::new(kind, m.as_str()))
        })
        .collect()
}

/// Concatenate token text.
pub fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_words_whitespace_and_punctuation() {
        let tokens = tokenize("Pay $100, now.");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Whitespace,
                TokenKind::Punctuation,
                TokenKind::Word,
                TokenKind::Punctuation,
                TokenKind::Whitespace,
                TokenKind::Word,
                TokenKind::Punctuation,
            ]
        );
    }

    #[test]
    fn hyphens_and_apostrophes_join_words() {
        assert_eq!(texts("non-disclosure"), vec!["non-disclosure"]);
        assert_eq!(texts("party's"), vec!["party's"]);
        assert_eq!(texts("party\u{2019}s"), vec!["party\u{2019}s"]);
        assert_eq!(texts("state-of-the-art"), vec!["state-of-the-art"]);
    }

    #[test]
    fn dangling_joiners_are_punctuation() {
        assert_eq!(texts("well- known"), vec!["well", "-", " ", "known"]);
        assert_eq!(texts("'quoted'"), vec!["'", "quoted", "'"]);
        assert_eq!(texts("a--b"), vec!["a", "-", "-", "b"]);
    }

    #[test]
    fn whitespace_runs_are_maximal() {
        assert_eq!(texts("a \t\n b"), vec!["a", " \t\n ", "b"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
    }

    proptest! {
        #[test]
        fn tokenize_is_lossless(s in "\\PC*") {
            prop_assert_eq!(join(&tokenize(&s)), s);
        }

        #[test]
        fn tokenize_is_lossless_with_joiners(s in "[a-z0-9 '\u{2019}\\-.,]{0,40}") {
            prop_assert_eq!(join(&tokenize(&s)), s);
        }
    }
}
