//! Completion state: which checklist items are marked done

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::key::ItemKey;

/// Mapping from item key to completed flag
///
/// An absent key reads as `false`. Entries are never removed by toggling; a
/// twice-toggled item keeps an explicit `false` entry, as persisted.
///
/// Persisted keys that do not parse as `"<step>-<item>"` are carried along
/// unchanged in a side map. They count toward `completed_count` and are
/// written back on serialize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionState {
    entries: BTreeMap<ItemKey, bool>,
    unrecognized: BTreeMap<String, bool>,
}

impl CompletionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag at `key` and return the new value
    pub fn toggle(&mut self, key: ItemKey) -> bool {
        let flag = self.entries.entry(key).or_insert(false);
        *flag = !*flag;
        debug!(%key, completed = *flag, "CompletionState::toggle: flipped");
        *flag
    }

    pub fn is_completed(&self, key: ItemKey) -> bool {
        self.entries.get(&key).copied().unwrap_or(false)
    }

    /// Count of true entries, whatever positions they refer to
    pub fn completed_count(&self) -> usize {
        self.entries
            .values()
            .chain(self.unrecognized.values())
            .filter(|done| **done)
            .count()
    }

    /// Keys whose flag is true
    pub fn completed_keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.entries.iter().filter(|(_, done)| **done).map(|(key, _)| *key)
    }

    /// Raw keys whose flag is true but which do not parse as an item key
    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.unrecognized
            .iter()
            .filter(|(_, done)| **done)
            .map(|(raw, _)| raw.as_str())
    }

    pub fn unrecognized(&self) -> &BTreeMap<String, bool> {
        &self.unrecognized
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ItemKey, bool> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.unrecognized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unrecognized.is_empty()
    }
}

impl FromIterator<(ItemKey, bool)> for CompletionState {
    fn from_iter<I: IntoIterator<Item = (ItemKey, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            unrecognized: BTreeMap::new(),
        }
    }
}

impl Serialize for CompletionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, done) in &self.entries {
            map.serialize_entry(&key.to_string(), done)?;
        }
        for (raw, done) in &self.unrecognized {
            map.serialize_entry(raw, done)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CompletionState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CompletionVisitor)
    }
}

struct CompletionVisitor;

impl<'de> Visitor<'de> for CompletionVisitor {
    type Value = CompletionState;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "a map of \"<step>-<item>\" keys to booleans")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut state = CompletionState::new();
        while let Some((raw, done)) = access.next_entry::<String, bool>()? {
            match raw.parse::<ItemKey>() {
                Ok(key) => {
                    state.entries.insert(key, done);
                }
                Err(e) => {
                    warn!(error = %e, "Keeping unrecognized checklist key as-is");
                    state.unrecognized.insert(raw, done);
                }
            }
        }
        Ok(state)
    }
}
