//! Data models for the fact archive

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// A fact and the URL it was attributed to.
///
/// Identity is the `text` alone; `source` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub text: String,
    pub source: String,
}

impl Fact {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Ordered collection of previously stored facts.
///
/// Backed by an insertion-ordered map keyed by fact text, so lookups are
/// constant time while iteration keeps stored order. No two entries ever
/// share the same text.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: IndexMap<String, Fact>,
}

/// Two archives are equal when they hold the same facts in the same order
impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.entries.values().eq(other.entries.values())
    }
}

impl Eq for Archive {}

impl Archive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a fact with the same text is already stored
    pub fn contains(&self, fact: &Fact) -> bool {
        self.contains_text(&fact.text)
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Append a fact if its text is new. Returns `true` when it was added.
    pub fn insert(&mut self, fact: Fact) -> bool {
        if self.entries.contains_key(&fact.text) {
            return false;
        }
        self.entries.insert(fact.text.clone(), fact);
        true
    }

    /// Fact at the given position in stored order
    pub fn get(&self, index: usize) -> Option<&Fact> {
        self.entries.get_index(index).map(|(_, fact)| fact)
    }

    /// Iterate in stored order
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.entries.values()
    }

    pub fn into_facts(self) -> Vec<Fact> {
        self.entries.into_values().collect()
    }
}

impl FromIterator<Fact> for Archive {
    /// First occurrence of a text wins; later duplicates and facts with
    /// blank text are dropped.
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        let mut archive = Archive::new();
        let mut duplicates = 0usize;
        let mut blank = 0usize;
        for fact in iter {
            if fact.text.trim().is_empty() {
                blank += 1;
            } else if !archive.insert(fact) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!("Dropped {} duplicate facts while building archive", duplicates);
        }
        if blank > 0 {
            warn!("Dropped {} facts with blank text while building archive", blank);
        }
        archive
    }
}

impl Serialize for Archive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for Archive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let facts = Vec::<Fact>::deserialize(deserializer)?;
        Ok(facts.into_iter().collect())
    }
}

/// Result of one fetch-dedupe-persist cycle that did not fail to write
#[derive(Debug)]
pub enum CycleOutcome {
    /// New fact appended and archive saved
    Added { fact: Fact, total: usize },
    /// Fact text already stored; archive untouched
    Duplicate(Fact),
    /// Fetcher failed; archive neither loaded nor written
    FetchFailed(crate::fetcher::FetchError),
}

impl CycleOutcome {
    /// Short label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Added { .. } => "added",
            CycleOutcome::Duplicate(_) => "duplicate",
            CycleOutcome::FetchFailed(_) => "fetch_failed",
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, CycleOutcome::Added { .. })
    }
}
