//! Character-addressable index over a paragraph's visible runs.
//!
//! Visible runs are the direct runs plus the runs inside every wrapper whose
//! text a reader sees: hyperlinks, field results, content controls and
//! pending insertions. Deleted and moved-from text is not indexed.
//!
//! The map is a snapshot: it is only valid until the paragraph's children are
//! mutated, after which it must be rebuilt.

use crate::document::{Node, Paragraph, Run};
use std::ops::Range;

/// Location of one character: fragment index plus offset inside that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharPosition {
    pub run: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunSlot {
    /// Position among the paragraph's children
    child: usize,
    /// Index inside the wrapper's runs; `None` for a direct run
    inner: Option<usize>,
    /// Character offset of the run's first character in the paragraph text
    start: usize,
    len: usize,
}

/// Where a zero-width insertion lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Strictly inside a run: the run must be split at `offset`.
    Inside { run: usize, offset: usize },
    /// Right after `run` (the preceding run donates formatting).
    After { run: usize },
    /// Right before `run`, at the very start of the text.
    Before { run: usize },
    /// Paragraph has no runs at all.
    Empty,
}

/// Fragments covered by a non-empty character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub first_run: usize,
    /// Offset of the first covered character in `first_run`
    pub start_offset: usize,
    pub last_run: usize,
    /// Offset one past the last covered character in `last_run`
    pub end_offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunCharacterMap {
    text: String,
    positions: Vec<CharPosition>,
    slots: Vec<RunSlot>,
}

impl RunCharacterMap {
    pub fn build(paragraph: &Paragraph) -> Self {
        let mut map = Self::default();
        for (child, node) in paragraph.children.iter().enumerate() {
            match node {
                Node::Run(run) => map.push_run(child, None, run),
                Node::Deletion(_) | Node::MoveFrom(_) => {}
                wrapper => {
                    for (inner, run) in wrapper.runs().iter().enumerate() {
                        map.push_run(child, Some(inner), run);
                    }
                }
            }
        }
        map
    }

    fn push_run(&mut self, child: usize, inner: Option<usize>, run: &Run) {
        let run_index = self.slots.len();
        let start = self.positions.len();
        for (offset, ch) in run.text.chars().enumerate() {
            self.positions.push(CharPosition {
                run: run_index,
                offset,
            });
            self.text.push(ch);
        }
        self.slots.push(RunSlot {
            child,
            inner,
            start,
            len: self.positions.len() - start,
        });
    }

    /// Visible paragraph text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn run_count(&self) -> usize {
        self.slots.len()
    }

    pub fn position(&self, char_index: usize) -> Option<CharPosition> {
        self.positions.get(char_index).copied()
    }

    /// Child position in the paragraph of the run with this fragment index.
    pub fn child_index(&self, run: usize) -> Option<usize> {
        self.slots.get(run).map(|slot| slot.child)
    }

    /// Whether the fragment is a run directly under the paragraph.
    pub fn is_direct(&self, run: usize) -> bool {
        self.slots.get(run).is_some_and(|slot| slot.inner.is_none())
    }

    /// Look up the run behind a fragment index.
    pub fn resolve<'p>(&self, paragraph: &'p Paragraph, run: usize) -> Option<&'p Run> {
        let slot = self.slots.get(run)?;
        let node = paragraph.children.get(slot.child)?;
        match slot.inner {
            None => node.as_run(),
            Some(inner) => node.runs().get(inner),
        }
    }

    /// Character range of the whole child node owning `run`. For a direct
    /// run this is the run itself; for a wrapper it spans all of its runs.
    pub fn node_span(&self, run: usize) -> Option<Range<usize>> {
        let child = self.slots.get(run)?.child;
        let mut owned = self.slots.iter().filter(|slot| slot.child == child);
        let first = owned.next()?;
        let end = owned.last().map_or(first.start + first.len, |s| s.start + s.len);
        Some(first.start..end)
    }

    /// Resolve a zero-width position in `[0, len]`.
    pub fn insertion_point(&self, char_index: usize) -> Option<InsertionPoint> {
        if char_index > self.len() {
            return None;
        }
        if self.slots.is_empty() {
            return Some(InsertionPoint::Empty);
        }
        if char_index == 0 {
            let run = self.position(0).map_or(0, |pos| pos.run);
            return Some(InsertionPoint::Before { run });
        }
        match self.position(char_index) {
            Some(pos) if pos.offset > 0 => Some(InsertionPoint::Inside {
                run: pos.run,
                offset: pos.offset,
            }),
            // At a run boundary or the end of the text: attach to the run
            // holding the preceding character.
            _ => self
                .position(char_index - 1)
                .map(|prev| InsertionPoint::After { run: prev.run }),
        }
    }

    /// Fragments covering `range`; `None` for empty or out-of-bounds ranges.
    pub fn coverage(&self, range: Range<usize>) -> Option<Coverage> {
        if range.start >= range.end || range.end > self.len() {
            return None;
        }
        let first = self.position(range.start)?;
        let last = self.position(range.end - 1)?;
        Some(Coverage {
            first_run: first.run,
            start_offset: first.offset,
            last_run: last.run,
            end_offset: last.offset + 1,
        })
    }

    /// Visible text in a character range.
    pub fn slice(&self, range: Range<usize>) -> String {
        self.text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Clock, FixedClock, Hyperlink, Revision};

    fn split_paragraph() -> Paragraph {
        Paragraph::from_runs([Run::new("The pa"), Run::new("rty"), Run::new(""), Run::new(" shall")])
    }

    #[test]
    fn maps_every_character() {
        let map = RunCharacterMap::build(&split_paragraph());
        assert_eq!(map.text(), "The party shall");
        assert_eq!(map.len(), 15);
        assert_eq!(map.run_count(), 4);
        assert_eq!(map.position(0), Some(CharPosition { run: 0, offset: 0 }));
        assert_eq!(map.position(6), Some(CharPosition { run: 1, offset: 0 }));
        assert_eq!(map.position(9), Some(CharPosition { run: 3, offset: 0 }));
        assert_eq!(map.position(15), None);
        assert_eq!(map.node_span(3), Some(9..15));
        assert_eq!(map.node_span(2), Some(9..9));
    }

    #[test]
    fn indexes_wrapped_runs() {
        let mut para = Paragraph::plain("see ");
        para.push(Node::Hyperlink(Hyperlink {
            target: "x".into(),
            runs: vec![Run::new("he"), Run::new("re")],
        }));
        para.push(Node::Run(Run::new(" now")));
        let map = RunCharacterMap::build(&para);
        assert_eq!(map.text(), "see here now");
        assert_eq!(map.run_count(), 4);
        assert!(map.is_direct(0));
        assert!(!map.is_direct(2));
        assert_eq!(map.child_index(2), Some(1));
        assert_eq!(map.child_index(3), Some(2));
        assert_eq!(map.node_span(2), Some(4..8));
        assert_eq!(map.node_span(3), Some(8..12));
        assert_eq!(map.resolve(&para, 2).map(|r| r.text.as_str()), Some("re"));
    }

    #[test]
    fn skips_deleted_text() {
        let mut para = Paragraph::plain("pay ");
        let mut deleted = Revision::new(1, "a", FixedClock::epoch().now());
        deleted.runs.push(Run::new("30"));
        let mut inserted = Revision::new(2, "a", FixedClock::epoch().now());
        inserted.runs.push(Run::new("45"));
        para.push(Node::Deletion(deleted));
        para.push(Node::Insertion(inserted));
        para.push(Node::Run(Run::new(" days")));

        let map = RunCharacterMap::build(&para);
        assert_eq!(map.text(), "pay 45 days");
        assert_eq!(map.text(), para.accepted_text());
        assert_eq!(map.child_index(1), Some(2));
        assert!(!map.is_direct(1));
    }

    #[test]
    fn insertion_points() {
        let map = RunCharacterMap::build(&split_paragraph());
        assert_eq!(map.insertion_point(0), Some(InsertionPoint::Before { run: 0 }));
        assert_eq!(
            map.insertion_point(2),
            Some(InsertionPoint::Inside { run: 0, offset: 2 })
        );
        assert_eq!(map.insertion_point(6), Some(InsertionPoint::After { run: 0 }));
        assert_eq!(map.insertion_point(9), Some(InsertionPoint::After { run: 1 }));
        assert_eq!(map.insertion_point(15), Some(InsertionPoint::After { run: 3 }));
        assert_eq!(map.insertion_point(16), None);

        let empty = RunCharacterMap::build(&Paragraph::new());
        assert_eq!(empty.insertion_point(0), Some(InsertionPoint::Empty));
    }

    #[test]
    fn coverage_across_runs() {
        let map = RunCharacterMap::build(&split_paragraph());
        let cov = map.coverage(4..12).unwrap();
        assert_eq!(
            cov,
            Coverage {
                first_run: 0,
                start_offset: 4,
                last_run: 3,
                end_offset: 3,
            }
        );
        assert_ne!(cov.first_run, cov.last_run);
        let single = map.coverage(4..6).unwrap();
        assert_eq!(single.first_run, single.last_run);
        assert!(map.coverage(3..3).is_none());
        assert!(map.coverage(10..16).is_none());
        assert_eq!(map.slice(4..12), "party sh");
    }

    #[test]
    fn positions_count_characters_not_bytes() {
        let map = RunCharacterMap::build(&Paragraph::from_runs([Run::new("naïve "), Run::new("café")]));
        assert_eq!(map.len(), 10);
        assert_eq!(map.position(6), Some(CharPosition { run: 1, offset: 0 }));
        assert_eq!(map.slice(3..8), "ve ca");
    }
}
