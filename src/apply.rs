//! Materialize diff hunks as tracked-change wrappers inside a paragraph.
//!
//! Hunks are applied from the highest offset down so that earlier offsets stay
//! valid, and the run index is rebuilt before each hunk. All hunks are
//! validated against the current paragraph text before anything is touched.
//!
//! Only direct runs are ever split. A replacement that reaches into a wrapper
//! (hyperlink, field, content control, pending insertion) is widened to cover
//! the whole wrapper, and insertions must land on a wrapper's edge.

use crate::charmap::{InsertionPoint, RunCharacterMap};
use crate::diff::EditHunk;
use crate::document::{Node, NodeKind, Paragraph, Run, RunProperties, TrackedChangeFactory};
use std::mem;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("hunk {index} has neither deleted nor inserted text")]
    EmptyHunk { index: usize },

    #[error("hunk {index} range {start}..{end} is outside paragraph text of {len} characters")]
    OutOfBounds {
        index: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("hunk {index} overlaps or precedes hunk {previous}")]
    Unordered { index: usize, previous: usize },

    #[error("hunk {index} expected {expected:?} at {start}..{end} but found {found:?}")]
    TextMismatch {
        index: usize,
        start: usize,
        end: usize,
        expected: String,
        found: String,
    },

    #[error("hunk {index} inserts at {at}, inside a {kind} that cannot be split")]
    InsideWrapper {
        index: usize,
        at: usize,
        kind: NodeKind,
    },

    #[error("fragment {run} does not resolve to a run of the paragraph")]
    NotARun { run: usize },
}

/// Change ids created while applying hunks, in application order
/// (last hunk first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "ApplyReport lists the revisions that were created"]
pub struct ApplyReport {
    pub hunks: usize,
    pub insertions: Vec<u64>,
    pub deletions: Vec<u64>,
}

impl ApplyReport {
    pub fn revision_count(&self) -> usize {
        self.insertions.len() + self.deletions.len()
    }
}

/// Where a pure insertion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Split the direct run `run` at `offset`
    Split { run: usize, offset: usize },
    /// Insert as child `position`, formatted like `donor` when there is one
    At { position: usize, donor: Option<usize> },
}

/// Check every hunk against the paragraph without mutating it.
pub fn validate(paragraph: &Paragraph, hunks: &[EditHunk]) -> Result<(), ApplyError> {
    prepare(paragraph, hunks).map(|_| ())
}

/// Widen hunks to whole wrappers, then check bounds, order, text and
/// insertion placement.
fn prepare(paragraph: &Paragraph, hunks: &[EditHunk]) -> Result<Vec<EditHunk>, ApplyError> {
    let map = RunCharacterMap::build(paragraph);
    let hunks: Vec<EditHunk> = hunks.iter().map(|h| widen(&map, h)).collect();

    for (index, hunk) in hunks.iter().enumerate() {
        if hunk.delete_text.is_empty() && hunk.insert_text.is_empty() {
            return Err(ApplyError::EmptyHunk { index });
        }
        let (start, end) = (hunk.chars.start, hunk.chars.end);
        if start > end || end > map.len() {
            return Err(ApplyError::OutOfBounds {
                index,
                start,
                end,
                len: map.len(),
            });
        }
        if let Some(prev) = index.checked_sub(1).map(|p| &hunks[p]) {
            if start <= prev.chars.start || start < prev.chars.end {
                return Err(ApplyError::Unordered {
                    index,
                    previous: index - 1,
                });
            }
        }
        let found = map.slice(hunk.chars.clone());
        if found != hunk.delete_text {
            return Err(ApplyError::TextMismatch {
                index,
                start,
                end,
                expected: hunk.delete_text.clone(),
                found,
            });
        }
        if hunk.is_insertion() {
            placement(paragraph, &map, (index, hunk))?;
        }
    }
    Ok(hunks)
}

/// Grow a replacement whose edges fall inside a wrapper to the wrapper's
/// edges, carrying the extra text on both the deleted and inserted side.
fn widen(map: &RunCharacterMap, hunk: &EditHunk) -> EditHunk {
    if hunk.is_insertion() {
        return hunk.clone();
    }
    let Some(cov) = map.coverage(hunk.chars.clone()) else {
        return hunk.clone();
    };

    let mut chars = hunk.chars.clone();
    if !map.is_direct(cov.first_run) {
        if let Some(span) = map.node_span(cov.first_run) {
            chars.start = chars.start.min(span.start);
        }
    }
    if !map.is_direct(cov.last_run) {
        if let Some(span) = map.node_span(cov.last_run) {
            chars.end = chars.end.max(span.end);
        }
    }
    if chars == hunk.chars {
        return hunk.clone();
    }

    let prefix = map.slice(chars.start..hunk.chars.start);
    let suffix = map.slice(hunk.chars.end..chars.end);
    tracing::debug!(from = ?hunk.chars, to = ?chars, "widened hunk to wrapper edges");
    EditHunk {
        delete_text: format!("{prefix}{}{suffix}", hunk.delete_text),
        insert_text: format!("{prefix}{}{suffix}", hunk.insert_text),
        chars,
        ..hunk.clone()
    }
}

/// Apply `hunks` (ordered by increasing offset) to `paragraph`.
///
/// A deletion hunk produces one deletion wrapper per stretch of removed text
/// (existing deletions in between keep their place), then at most one
/// insertion wrapper. Removed text that was itself a pending insertion is
/// dropped instead of being tracked as deleted. Pure insertions produce a
/// single insertion wrapper.
pub fn apply<F>(
    paragraph: &mut Paragraph,
    hunks: &[EditHunk],
    factory: &mut F,
    author: &str,
) -> Result<ApplyReport, ApplyError>
where
    F: TrackedChangeFactory + ?Sized,
{
    let hunks = prepare(paragraph, hunks)?;

    let mut report = ApplyReport::default();
    for (index, hunk) in hunks.iter().enumerate().rev() {
        let map = RunCharacterMap::build(paragraph);
        if hunk.is_insertion() {
            let id = insert(paragraph, &map, (index, hunk), factory, author)?;
            report.insertions.push(id);
        } else {
            let (deleted, inserted) = replace(paragraph, &map, (index, hunk), factory, author)?;
            report.deletions.extend(deleted);
            report.insertions.extend(inserted);
        }
        report.hunks += 1;
        tracing::debug!(
            hunk = index,
            chars = ?hunk.chars,
            delete = %hunk.delete_text,
            insert = %hunk.insert_text,
            "applied hunk"
        );
    }
    Ok(report)
}

fn resolve<'p>(
    paragraph: &'p Paragraph,
    map: &RunCharacterMap,
    run: usize,
) -> Result<(usize, &'p Run), ApplyError> {
    let child = map.child_index(run).ok_or(ApplyError::NotARun { run })?;
    let source = map
        .resolve(paragraph, run)
        .ok_or(ApplyError::NotARun { run })?;
    Ok((child, source))
}

fn placement(
    paragraph: &Paragraph,
    map: &RunCharacterMap,
    (index, hunk): (usize, &EditHunk),
) -> Result<Placement, ApplyError> {
    let at = hunk.chars.start;
    let point = map.insertion_point(at).ok_or(ApplyError::OutOfBounds {
        index,
        start: at,
        end: at,
        len: map.len(),
    })?;
    let inside = |run: usize| {
        let kind = map
            .child_index(run)
            .and_then(|child| paragraph.children.get(child))
            .map(Node::kind)
            .ok_or(ApplyError::NotARun { run });
        match kind {
            Ok(kind) => ApplyError::InsideWrapper { index, at, kind },
            Err(err) => err,
        }
    };
    // A wrapper edge is where its node span starts or ends.
    let on_edge = |run: usize| {
        map.is_direct(run)
            || map
                .node_span(run)
                .is_some_and(|span| span.start == at || span.end == at)
    };

    match point {
        InsertionPoint::Inside { run, offset } if map.is_direct(run) => {
            Ok(Placement::Split { run, offset })
        }
        InsertionPoint::Inside { run, .. } => Err(inside(run)),
        InsertionPoint::After { run } | InsertionPoint::Before { run } if !on_edge(run) => {
            Err(inside(run))
        }
        InsertionPoint::After { run } => {
            let (child, _) = resolve(paragraph, map, run)?;
            Ok(Placement::At {
                position: child + 1,
                donor: Some(run),
            })
        }
        InsertionPoint::Before { run } => {
            let (child, _) = resolve(paragraph, map, run)?;
            Ok(Placement::At {
                position: child,
                donor: Some(run),
            })
        }
        InsertionPoint::Empty => Ok(Placement::At {
            position: paragraph.children.len(),
            donor: None,
        }),
    }
}

fn make_insertion<F>(factory: &mut F, text: &str, author: &str, properties: &RunProperties) -> Node
where
    F: TrackedChangeFactory + ?Sized,
{
    let mut revision = factory.create_insertion(text, author);
    revision.set_properties(properties);
    Node::Insertion(revision)
}

fn insert<F>(
    paragraph: &mut Paragraph,
    map: &RunCharacterMap,
    (index, hunk): (usize, &EditHunk),
    factory: &mut F,
    author: &str,
) -> Result<u64, ApplyError>
where
    F: TrackedChangeFactory + ?Sized,
{
    match placement(paragraph, map, (index, hunk))? {
        Placement::Split { run, offset } => {
            let (child, source) = resolve(paragraph, map, run)?;
            let (before, after) = source.split_at(offset);
            let node = make_insertion(factory, &hunk.insert_text, author, &source.properties);
            let id = revision_id(&node);
            paragraph
                .children
                .splice(child..=child, [Node::Run(before), node, Node::Run(after)]);
            Ok(id)
        }
        Placement::At { position, donor } => {
            let properties = match donor {
                Some(run) => resolve(paragraph, map, run)?.1.properties.clone(),
                None => RunProperties::default(),
            };
            let node = make_insertion(factory, &hunk.insert_text, author, &properties);
            let id = revision_id(&node);
            paragraph.children.insert(position, node);
            Ok(id)
        }
    }
}

/// Stretch of removed runs waiting to be wrapped in one deletion.
struct DeletionGroup<'a, F: ?Sized> {
    runs: Vec<Run>,
    ids: Vec<u64>,
    factory: &'a mut F,
    author: &'a str,
}

impl<F: TrackedChangeFactory + ?Sized> DeletionGroup<'_, F> {
    fn flush(&mut self, out: &mut Vec<Node>) {
        if self.runs.is_empty() {
            return;
        }
        let runs = mem::take(&mut self.runs);
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        let mut deletion = self.factory.create_deletion(&text, self.author);
        deletion.set_runs(runs);
        self.ids.push(deletion.id);
        out.push(Node::Deletion(deletion));
    }
}

fn replace<F>(
    paragraph: &mut Paragraph,
    map: &RunCharacterMap,
    (index, hunk): (usize, &EditHunk),
    factory: &mut F,
    author: &str,
) -> Result<(Vec<u64>, Option<u64>), ApplyError>
where
    F: TrackedChangeFactory + ?Sized,
{
    let cov = map
        .coverage(hunk.chars.clone())
        .ok_or(ApplyError::OutOfBounds {
            index,
            start: hunk.chars.start,
            end: hunk.chars.end,
            len: map.len(),
        })?;
    let (first_child, first_run) = resolve(paragraph, map, cov.first_run)?;
    let (last_child, _) = resolve(paragraph, map, cov.last_run)?;
    let insert_properties = first_run.properties.clone();

    let mut out = Vec::new();
    let mut suffix = None;
    let mut group = DeletionGroup {
        runs: Vec::new(),
        ids: Vec::new(),
        factory: &mut *factory,
        author,
    };

    for child in first_child..=last_child {
        let node = &paragraph.children[child];
        match node {
            Node::Run(run) => {
                let len = run.char_len();
                let start = if child == first_child { cov.start_offset } else { 0 };
                let end = if child == last_child { cov.end_offset } else { len };
                if start > 0 {
                    out.push(Node::Run(run.slice(0, start)));
                }
                let piece = run.slice(start, end);
                if !piece.is_empty() {
                    group.runs.push(piece);
                }
                if end < len {
                    suffix = Some(Node::Run(run.slice(end, len)));
                }
            }
            // Withdrawing a pending insertion needs no deletion record.
            Node::Insertion(_) | Node::MoveTo(_) => {}
            Node::Deletion(_) | Node::MoveFrom(_) => {
                group.flush(&mut out);
                out.push(node.clone());
            }
            wrapper if wrapper.runs().iter().all(Run::is_empty) => out.push(wrapper.clone()),
            wrapper => group
                .runs
                .extend(wrapper.runs().iter().filter(|r| !r.is_empty()).cloned()),
        }
    }
    group.flush(&mut out);
    let deleted = mem::take(&mut group.ids);
    drop(group);

    let insertion = (!hunk.insert_text.is_empty())
        .then(|| make_insertion(factory, &hunk.insert_text, author, &insert_properties));
    let insertion_id = insertion.as_ref().map(revision_id);
    out.extend(insertion);
    out.extend(suffix);

    paragraph.children.splice(first_child..=last_child, out);
    Ok((deleted, insertion_id))
}

fn revision_id(node: &Node) -> u64 {
    match node {
        Node::Insertion(rev) | Node::Deletion(rev) | Node::MoveFrom(rev) | Node::MoveTo(rev) => rev.id,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{diff, MinimalDiff, DEFAULT_MAX_HUNKS};
    use crate::document::{ChangeIdCounter, Clock, FixedClock, Hyperlink, Revision, RevisionFactory};

    fn factory() -> RevisionFactory<FixedClock> {
        RevisionFactory::with_clock(ChangeIdCounter::default(), FixedClock::epoch())
    }

    fn props(font: &str) -> RunProperties {
        RunProperties {
            font: Some(font.to_string()),
            ..RunProperties::default()
        }
    }

    /// "See the terms now." with "the terms" inside a hyperlink.
    fn linked() -> Paragraph {
        let mut para = Paragraph::plain("See ");
        para.push(Node::Hyperlink(Hyperlink {
            target: "https://example.com/terms".into(),
            runs: vec![Run::new("the terms")],
        }));
        para.push(Node::Run(Run::new(" now.")));
        para
    }

    fn revision(id: u64, text: &str) -> Revision {
        let mut rev = Revision::new(id, "earlier", FixedClock::epoch().now());
        rev.runs.push(Run::new(text));
        rev
    }

    fn kinds(para: &Paragraph) -> Vec<&'static str> {
        para.children
            .iter()
            .map(|n| match n {
                Node::Run(_) => "run",
                Node::Insertion(_) => "ins",
                Node::Deletion(_) => "del",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn insertion_inside_run_splits_it() {
        let mut para = Paragraph::from_runs([Run::with_properties("pay the fee", props("Arial"))]);
        let hunk = EditHunk::insertion("annual ", 8);
        let report = apply(&mut para, &[hunk], &mut factory(), "Reviewer").unwrap();
        assert_eq!(report.insertions, vec![1]);
        assert_eq!(kinds(&para), vec!["run", "ins", "run"]);
        assert_eq!(para.accepted_text(), "pay the annual fee");
        assert_eq!(para.rejected_text(), "pay the fee");
        match &para.children[1] {
            Node::Insertion(rev) => {
                assert_eq!(rev.author, "Reviewer");
                assert_eq!(rev.runs[0].properties, props("Arial"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn insertion_at_boundary_does_not_split() {
        let mut para = Paragraph::from_runs([
            Run::with_properties("pay ", props("A")),
            Run::with_properties("fee", props("B")),
        ]);
        let _ = apply(&mut para, &[EditHunk::insertion("the ", 4)], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["run", "ins", "run"]);
        assert_eq!(para.children[0].runs()[0].text, "pay ");
        // Inherits from the preceding run.
        assert_eq!(para.children[1].runs()[0].properties, props("A"));
    }

    #[test]
    fn insertion_at_start_inherits_following_run() {
        let mut para = Paragraph::from_runs([Run::with_properties("fee", props("B"))]);
        let _ = apply(&mut para, &[EditHunk::insertion("The ", 0)], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["ins", "run"]);
        assert_eq!(para.children[0].runs()[0].properties, props("B"));
        assert_eq!(para.accepted_text(), "The fee");
    }

    #[test]
    fn insertion_into_empty_paragraph() {
        let mut para = Paragraph::new();
        let _ = apply(&mut para, &[EditHunk::insertion("Hello", 0)], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["ins"]);
        assert_eq!(para.accepted_text(), "Hello");
    }

    #[test]
    fn replacement_inside_one_run() {
        let mut para = Paragraph::from_runs([Run::with_properties("within 30 days", props("Times"))]);
        let hunk = EditHunk::whole_span("30", "45", 7..9);
        let report = apply(&mut para, &[hunk], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["run", "del", "ins", "run"]);
        assert_eq!(report.deletions, vec![1]);
        assert_eq!(report.insertions, vec![2]);
        assert_eq!(para.accepted_text(), "within 45 days");
        assert_eq!(para.rejected_text(), "within 30 days");
        for node in &para.children {
            for run in node.runs() {
                assert_eq!(run.properties, props("Times"));
            }
        }
    }

    #[test]
    fn deletion_of_whole_run_leaves_no_empty_runs() {
        let mut para = Paragraph::from_runs([Run::new("a "), Run::new("bad"), Run::new(" b")]);
        let _ = apply(&mut para, &[EditHunk::whole_span("bad", "", 2..5)], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["run", "del", "run"]);
        assert!(para.runs().all(|r| !r.is_empty()));
    }

    #[test]
    fn replacement_across_runs_keeps_each_runs_formatting() {
        let mut para = Paragraph::from_runs([
            Run::with_properties("pay in 3", props("A")),
            Run::with_properties("0 da", props("B")),
            Run::with_properties("ys now", props("C")),
        ]);
        let hunk = EditHunk::whole_span("30 days", "45 business days", 7..14);
        let _ = apply(&mut para, &[hunk], &mut factory(), "r").unwrap();

        assert_eq!(kinds(&para), vec!["run", "del", "ins", "run"]);
        assert_eq!(para.children[0].runs()[0], Run::with_properties("pay in ", props("A")));
        assert_eq!(para.children[3].runs()[0], Run::with_properties(" now", props("C")));

        let deleted = para.children[1].runs();
        assert_eq!(deleted.len(), 3);
        assert_eq!(deleted[0], Run::with_properties("3", props("A")));
        assert_eq!(deleted[1], Run::with_properties("0 da", props("B")));
        assert_eq!(deleted[2], Run::with_properties("ys", props("C")));
        assert_eq!(para.children[2].runs()[0].properties, props("A"));
        assert_eq!(para.accepted_text(), "pay in 45 business days now");
        assert_eq!(para.rejected_text(), "pay in 30 days now");
    }

    #[test]
    fn multiple_hunks_apply_back_to_front() {
        let original = "The party shall pay $100 within 30 days.";
        let new = "The Buyer shall pay $150 within 45 days.";
        let mut para = Paragraph::from_runs([
            Run::with_properties("The pa", props("A")),
            Run::with_properties("rty shall pay $1", props("B")),
            Run::with_properties("00 within 3", props("C")),
            Run::with_properties("0 days.", props("D")),
        ]);
        let MinimalDiff::Changes(hunks) = diff(original, new, DEFAULT_MAX_HUNKS) else {
            panic!("expected changes");
        };
        assert_eq!(hunks.len(), 3);
        let report = apply(&mut para, &hunks, &mut factory(), "r").unwrap();
        assert_eq!(report.hunks, 3);
        assert_eq!(report.revision_count(), 6);
        assert_eq!(para.accepted_text(), new);
        assert_eq!(para.rejected_text(), original);

        // Every deletion is immediately followed by its insertion.
        for (idx, node) in para.children.iter().enumerate() {
            if matches!(node, Node::Deletion(_)) {
                assert!(matches!(para.children[idx + 1], Node::Insertion(_)));
            }
        }
    }

    #[test]
    fn validation_rejects_before_mutating() {
        let mut para = Paragraph::plain("abc def");
        let before = para.clone();
        let good = EditHunk::whole_span("def", "xyz", 4..7);
        let bad = EditHunk::whole_span("zzz", "q", 0..3);
        let err = apply(&mut para, &[bad, good], &mut factory(), "r").unwrap_err();
        assert!(matches!(err, ApplyError::TextMismatch { index: 0, .. }));
        assert_eq!(para, before);

        let err = apply(
            &mut para,
            &[EditHunk::whole_span("", "", 1..1)],
            &mut factory(),
            "r",
        )
        .unwrap_err();
        assert_eq!(err, ApplyError::EmptyHunk { index: 0 });

        let err = apply(
            &mut para,
            &[EditHunk::whole_span("def", "x", 4..7), EditHunk::whole_span("abc", "y", 0..3)],
            &mut factory(),
            "r",
        )
        .unwrap_err();
        assert_eq!(err, ApplyError::Unordered { index: 1, previous: 0 });

        let err = apply(&mut para, &[EditHunk::insertion("x", 99)], &mut factory(), "r").unwrap_err();
        assert!(matches!(err, ApplyError::OutOfBounds { .. }));
        assert_eq!(para, before);
    }

    #[test]
    fn replacement_across_hyperlink_deletes_whole_link() {
        let mut para = linked();
        let hunk = EditHunk::whole_span("the terms now", "the conditions now", 4..17);
        let report = apply(&mut para, &[hunk], &mut factory(), "r").unwrap();

        assert_eq!(report.revision_count(), 2);
        assert_eq!(kinds(&para), vec!["run", "del", "ins", "run"]);
        let deleted = para.children[1].runs();
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted[0].text, "the terms");
        assert_eq!(deleted[1].text, " now");
        assert_eq!(para.accepted_text(), "See the conditions now.");
        assert_eq!(para.rejected_text(), "See the terms now.");
    }

    #[test]
    fn partial_hyperlink_replacement_widens_to_the_link() {
        let mut para = linked();
        let hunk = EditHunk::whole_span("terms now", "conditions now", 8..17);
        let _ = apply(&mut para, &[hunk], &mut factory(), "r").unwrap();

        assert_eq!(kinds(&para), vec!["run", "del", "ins", "run"]);
        assert_eq!(para.children[1].runs()[0].text, "the terms");
        assert_eq!(para.children[2].runs()[0].text, "the conditions now");
        assert_eq!(para.accepted_text(), "See the conditions now.");
        assert_eq!(para.rejected_text(), "See the terms now.");
    }

    #[test]
    fn insertion_must_land_on_a_link_edge() {
        let mut para = linked();
        let before = para.clone();
        let err = apply(&mut para, &[EditHunk::insertion("x", 6)], &mut factory(), "r").unwrap_err();
        assert_eq!(
            err,
            ApplyError::InsideWrapper {
                index: 0,
                at: 6,
                kind: NodeKind::Hyperlink
            }
        );
        assert_eq!(para, before);

        let _ = apply(&mut para, &[EditHunk::insertion(" and fees", 13)], &mut factory(), "r").unwrap();
        assert_eq!(kinds(&para), vec!["run", "other", "ins", "run"]);
        assert_eq!(para.accepted_text(), "See the terms and fees now.");
    }

    #[test]
    fn replacing_pending_insertion_withdraws_it() {
        let mut para = Paragraph::plain("Pay within ");
        para.push(Node::Deletion(revision(1, "30")));
        para.push(Node::Insertion(revision(2, "45")));
        para.push(Node::Run(Run::new(" days.")));
        let mut factory = RevisionFactory::with_clock(ChangeIdCounter::new(3), FixedClock::epoch());

        let hunk = EditHunk::whole_span("45 days", "60 days", 11..18);
        let report = apply(&mut para, &[hunk], &mut factory, "r").unwrap();

        assert_eq!(report.deletions, vec![3]);
        assert_eq!(report.insertions, vec![4]);
        assert_eq!(kinds(&para), vec!["run", "del", "del", "ins", "run"]);
        assert_eq!(para.children[2].runs()[0].text, " days");
        assert_eq!(para.accepted_text(), "Pay within 60 days.");
        assert_eq!(para.rejected_text(), "Pay within 30 days.");
    }

    #[test]
    fn existing_deletion_keeps_its_place() {
        let mut para = Paragraph::plain("a ");
        para.push(Node::Deletion(revision(1, "old")));
        para.push(Node::Run(Run::new("b c")));
        let before = para.rejected_text();
        let mut factory = RevisionFactory::with_clock(ChangeIdCounter::new(2), FixedClock::epoch());

        let report = apply(&mut para, &[EditHunk::whole_span("a b", "x", 0..3)], &mut factory, "r").unwrap();
        assert_eq!(report.deletions, vec![2, 3]);
        assert_eq!(report.insertions, vec![4]);
        assert_eq!(kinds(&para), vec!["del", "del", "del", "ins", "run"]);
        assert_eq!(para.children[1].runs()[0].text, "old");
        assert_eq!(para.accepted_text(), "x c");
        assert_eq!(para.rejected_text(), before);
    }
}
