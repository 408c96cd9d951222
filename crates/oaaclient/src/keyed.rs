//! Ordered map with case-insensitive string keys.
//!
//! Template containers key entities by name or unique identifier. The remote
//! platform treats those identifiers case-insensitively, so `Alice` and
//! `alice` must collide. Iteration follows insertion order so serialized
//! payloads are stable.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Insertion-ordered map whose keys are compared after lower-casing.
///
/// # Examples
///
/// ```
/// use oaaclient::keyed::CaseInsensitiveMap;
///
/// let mut users = CaseInsensitiveMap::new();
/// users.insert("Alice", 1);
/// assert_eq!(users.get("ALICE"), Some(&1));
/// assert!(users.try_insert("alice", 2).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CaseInsensitiveMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> CaseInsensitiveMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value stored under `key`, returning the
    /// previous value. A replaced entry keeps its original position.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let lowered = key.to_lowercase();
        if let Some(slot) = self
            .index
            .get(&lowered)
            .and_then(|position| self.entries.get_mut(*position))
        {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.index.insert(lowered.clone(), self.entries.len());
        self.entries.push((lowered, value));
        None
    }

    /// Inserts `value` only when `key` is absent.
    ///
    /// Returns a mutable reference to the stored value, or `None` when the
    /// key already exists (the map is left untouched).
    pub fn try_insert(&mut self, key: &str, value: V) -> Option<&mut V> {
        let lowered = key.to_lowercase();
        if self.index.contains_key(&lowered) {
            return None;
        }
        let position = self.entries.len();
        self.index.insert(lowered.clone(), position);
        self.entries.push((lowered, value));
        self.entries.last_mut().map(|entry| &mut entry.1)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index
            .get(&key.to_lowercase())
            .and_then(|position| self.entries.get(*position))
            .map(|entry| &entry.1)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.index
            .get(&key.to_lowercase())
            .and_then(|position| self.entries.get_mut(*position))
            .map(|entry| &mut entry.1)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&key.to_lowercase())
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let position = self.index.remove(&key.to_lowercase())?;
        if position >= self.entries.len() {
            return None;
        }
        let (_, value) = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(lower-cased key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterates over the lower-cased keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Iterates mutably over values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, value)| value)
    }
}

impl<V: Serialize> Serialize for CaseInsensitiveMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Serializes only the values of a map, as a JSON array.
///
/// Used with `#[serde(serialize_with = "...")]` where a payload lists
/// entities rather than keying them.
pub(crate) fn serialize_values<V, S>(
    map: &CaseInsensitiveMap<V>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.values())
}
