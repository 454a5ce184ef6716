use crate::document::ParagraphId;
use crate::edit::{EditOptions, EditRequest, Target};
use crate::locate::{Query, Scope};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditScript {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub options: ScriptOptions,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

impl EditScript {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }
        if self.options.max_hunks == Some(0) {
            issues.push(ValidationIssue::InvalidCombo {
                edit_id: None,
                message: "options.max_hunks must be at least 1".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for edit in &self.edits {
            let id = edit.id.trim();
            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateId { id: id.to_string() });
            }
            edit.validate_into(&mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Layer the script's options over `base`.
    ///
    /// Author precedence, highest first: `author_override` (e.g. from the
    /// command line), `meta.author`, `options.author`, then `base.author`.
    pub fn edit_options(&self, base: &EditOptions, author_override: Option<&str>) -> EditOptions {
        let mut options = base.clone();
        if let Some(max) = self.options.max_hunks {
            options.max_hunks = max;
        }
        if let Some(normalize) = self.options.normalize_quotes {
            options.normalize_quotes = normalize;
        }
        if let Some(minimal) = self.options.minimal {
            options.minimal = minimal;
        }
        let author = author_override
            .or(self.meta.author.as_deref())
            .or(self.options.author.as_deref());
        if let Some(author) = author {
            options.author = author.to_string();
        }
        options
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Per-script overrides of [`EditOptions`].
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScriptOptions {
    #[serde(default)]
    pub max_hunks: Option<usize>,
    #[serde(default)]
    pub normalize_quotes: Option<bool>,
    #[serde(default)]
    pub minimal: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EditKind {
    Replace,
    Delete,
    InsertAfter,
    InsertBefore,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Replace => "replace",
            EditKind::Delete => "delete",
            EditKind::InsertAfter => "insert-after",
            EditKind::InsertBefore => "insert-before",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EditKind,
    /// Literal text to locate
    #[serde(default)]
    pub find: Option<String>,
    /// Regex to locate, instead of `find`
    #[serde(default)]
    pub pattern: Option<String>,
    /// Replacement text for `replace`
    #[serde(default)]
    pub with: Option<String>,
    /// Inserted text for `insert-after` / `insert-before`
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub paragraph: Option<usize>,
    #[serde(default)]
    pub paragraphs: Option<Vec<usize>>,
}

impl EditDefinition {
    fn validate_into(&self, issues: &mut Vec<ValidationIssue>) {
        let edit_id = Some(self.id.clone());
        let combo = |message: &str| ValidationIssue::InvalidCombo {
            edit_id: edit_id.clone(),
            message: message.to_string(),
        };

        match (&self.find, &self.pattern) {
            (None, None) => issues.push(ValidationIssue::MissingField {
                edit_id: edit_id.clone(),
                field: "find",
            }),
            (Some(_), Some(_)) => issues.push(combo("find and pattern cannot both be set")),
            (Some(find), None) if find.is_empty() => issues.push(ValidationIssue::MissingField {
                edit_id: edit_id.clone(),
                field: "find",
            }),
            (None, Some(pattern)) => {
                if let Err(err) = regex::Regex::new(pattern) {
                    issues.push(ValidationIssue::InvalidPattern {
                        edit_id: edit_id.clone(),
                        message: err.to_string(),
                    });
                }
            }
            (Some(_), None) => {}
        }

        if self.paragraph.is_some() && self.paragraphs.is_some() {
            issues.push(combo("paragraph and paragraphs cannot both be set"));
        }

        match self.kind {
            EditKind::Replace => {
                if self.with.is_none() {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: edit_id.clone(),
                        field: "with",
                    });
                }
                if self.text.is_some() {
                    issues.push(combo("replace takes `with`, not `text`"));
                }
            }
            EditKind::Delete => {
                if self.with.is_some() || self.text.is_some() {
                    issues.push(combo("delete takes no replacement text"));
                }
            }
            EditKind::InsertAfter | EditKind::InsertBefore => {
                if self.text.as_deref().unwrap_or("").is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: edit_id.clone(),
                        field: "text",
                    });
                }
                if self.with.is_some() {
                    issues.push(combo("insertions take `text`, not `with`"));
                }
            }
        }
    }

    pub fn scope(&self) -> Scope {
        match (self.paragraph, &self.paragraphs) {
            (Some(idx), _) => Scope::Paragraph(ParagraphId(idx)),
            (None, Some(list)) => Scope::Paragraphs(list.iter().copied().map(ParagraphId).collect()),
            (None, None) => Scope::All,
        }
    }

    pub fn target(&self) -> Target {
        let query = match (&self.pattern, &self.find) {
            (Some(pattern), _) => Query::pattern(pattern.clone()),
            (None, find) => Query::literal(find.clone().unwrap_or_default()),
        };
        Target {
            query,
            scope: self.scope(),
        }
    }

    /// Convert to an editor request. Assumes the script passed validation.
    pub fn to_request(&self) -> EditRequest {
        let target = self.target();
        match self.kind {
            EditKind::Replace => EditRequest::Replace {
                target,
                replacement: self.with.clone().unwrap_or_default(),
            },
            EditKind::Delete => EditRequest::Delete { target },
            EditKind::InsertAfter => EditRequest::InsertAfter {
                anchor: target,
                text: self.text.clone().unwrap_or_default(),
            },
            EditKind::InsertBefore => EditRequest::InsertBefore {
                anchor: target,
                text: self.text.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        id: String,
    },
    InvalidPattern {
        edit_id: Option<String>,
        message: String,
    },
    InvalidCombo {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit script contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { id } => write!(f, "edit id '{id}' is used more than once"),
            ValidationIssue::InvalidPattern { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' has an invalid pattern: {message}"),
                None => write!(f, "invalid pattern: {message}"),
            },
            ValidationIssue::InvalidCombo { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid edit script: {message}"),
            },
        }
    }
}
