//! Tracked-change wrappers and the factory that stamps them.

use crate::document::{Document, Node, Run, RunProperties};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A revision container: inserted or deleted runs plus review metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: u64,
    pub author: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Revision {
    pub fn new(id: u64, author: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id,
            author: author.into(),
            date,
            runs: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Give every run in the wrapper its own copy of `properties`.
    pub fn set_properties(&mut self, properties: &RunProperties) {
        for run in &mut self.runs {
            run.properties = properties.clone();
        }
    }

    /// Replace the wrapped runs, e.g. with one carved run per source run.
    pub fn set_runs(&mut self, runs: Vec<Run>) {
        self.runs = runs;
    }
}

/// Sequential change-id source.
///
/// Ids must be unique per document. The counter is owned by whoever drives the
/// edits; sharing it between concurrent edits needs outside synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeIdCounter {
    next: u64,
}

impl ChangeIdCounter {
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// Counter that continues after the highest id already in `document`.
    pub fn after_document(document: &Document) -> Self {
        let max = document
            .paragraphs
            .iter()
            .flat_map(|p| p.children.iter())
            .filter_map(|node| match node {
                Node::Insertion(rev) | Node::Deletion(rev) | Node::MoveFrom(rev) | Node::MoveTo(rev) => {
                    Some(rev.id)
                }
                _ => None,
            })
            .max();
        Self::new(max.map_or(1, |id| id + 1))
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for ChangeIdCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Time source for revision timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        // Word stores revision dates at second precision.
        let now = Utc::now();
        Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now)
    }
}

/// Clock pinned to one instant, for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn epoch() -> Self {
        FixedClock(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Manufactures revision wrappers.
///
/// The patch applier treats the returned revisions as opaque containers: it
/// only reparents run properties into them and splices them into the tree.
pub trait TrackedChangeFactory {
    fn create_insertion(&mut self, text: &str, author: &str) -> Revision;
    fn create_deletion(&mut self, text: &str, author: &str) -> Revision;
}

impl<F: TrackedChangeFactory + ?Sized> TrackedChangeFactory for &mut F {
    fn create_insertion(&mut self, text: &str, author: &str) -> Revision {
        (**self).create_insertion(text, author)
    }

    fn create_deletion(&mut self, text: &str, author: &str) -> Revision {
        (**self).create_deletion(text, author)
    }
}

/// Default factory: sequential ids plus a clock.
#[derive(Debug, Clone)]
pub struct RevisionFactory<C = SystemClock> {
    ids: ChangeIdCounter,
    clock: C,
}

impl RevisionFactory<SystemClock> {
    pub fn new(ids: ChangeIdCounter) -> Self {
        Self {
            ids,
            clock: SystemClock,
        }
    }

    /// Factory whose ids continue after the revisions already in `document`.
    pub fn for_document(document: &Document) -> Self {
        Self::new(ChangeIdCounter::after_document(document))
    }
}

impl<C: Clock> RevisionFactory<C> {
    pub fn with_clock(ids: ChangeIdCounter, clock: C) -> Self {
        Self { ids, clock }
    }

    pub fn counter(&self) -> ChangeIdCounter {
        self.ids
    }

    fn stamp(&mut self, text: &str, author: &str) -> Revision {
        let mut revision = Revision::new(self.ids.next_id(), author, self.clock.now());
        revision.runs.push(Run::new(text));
        revision
    }
}

impl<C: Clock> TrackedChangeFactory for RevisionFactory<C> {
    fn create_insertion(&mut self, text: &str, author: &str) -> Revision {
        self.stamp(text, author)
    }

    fn create_deletion(&mut self, text: &str, author: &str) -> Revision {
        self.stamp(text, author)
    }
}
