use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An immutable insertion-ordered map. Re-associating a key keeps its
/// original position; associating an already-present equal value, or
/// removing an absent key, returns a handle to the same underlying
/// storage.
pub struct ConstMap<K, V> {
    entries: Arc<Vec<(K, V)>>,
}

impl<K, V> ConstMap<K, V> {
    pub fn empty() -> ConstMap<K, V> {
        ConstMap {
            entries: Arc::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// The entry at `index` in insertion order.
    pub fn entry_at(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    pub fn same_storage(&self, other: &ConstMap<K, V>) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K: PartialEq, V> ConstMap<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries.iter().any(|(k, _)| k.borrow() == key)
    }
}

impl<K: Clone + PartialEq, V: Clone + PartialEq> ConstMap<K, V> {
    /// A new map associating `key` with `value`. A present key keeps its
    /// position; a present key with an equal value is a no-op returning
    /// this same map.
    pub fn with(&self, key: K, value: V) -> ConstMap<K, V> {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(at) => {
                if self.entries[at].1 == value {
                    return self.clone();
                }
                let mut entries: Vec<(K, V)> = self.entries.as_ref().clone();
                entries[at].1 = value;
                ConstMap {
                    entries: Arc::new(entries),
                }
            }
            None => {
                let mut entries = Vec::with_capacity(self.entries.len() + 1);
                entries.extend_from_slice(&self.entries);
                entries.push((key, value));
                ConstMap {
                    entries: Arc::new(entries),
                }
            }
        }
    }

    /// A new map lacking `key`, or this same map if it was absent.
    pub fn without<Q>(&self, key: &Q) -> ConstMap<K, V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self.entries.iter().position(|(k, _)| k.borrow() == key) {
            None => self.clone(),
            Some(at) => {
                let mut entries: Vec<(K, V)> = self.entries.as_ref().clone();
                entries.remove(at);
                ConstMap {
                    entries: Arc::new(entries),
                }
            }
        }
    }
}

impl<K, V> Clone for ConstMap<K, V> {
    fn clone(&self) -> ConstMap<K, V> {
        ConstMap {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for ConstMap<K, V> {
    fn default() -> ConstMap<K, V> {
        ConstMap::empty()
    }
}

/// Map equality is order-insensitive over key→value pairs.
impl<K: PartialEq, V: PartialEq> PartialEq for ConstMap<K, V> {
    fn eq(&self, other: &ConstMap<K, V>) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<K: Eq, V: Eq> Eq for ConstMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ConstMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for ConstMap<K, V> {
    /// A duplicated key keeps its first position with the last value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> ConstMap<K, V> {
        let mut entries: Vec<(K, V)> = Vec::new();
        for (key, value) in iter {
            match entries.iter().position(|(k, _)| *k == key) {
                Some(at) => entries[at].1 = value,
                None => entries.push((key, value)),
            }
        }
        ConstMap {
            entries: Arc::new(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConstMap<String, i32> {
        [("a".to_owned(), 1), ("b".to_owned(), 2)]
            .into_iter()
            .collect()
    }

    #[test]
    fn reassociation_keeps_position() {
        let m = sample().with("a".to_owned(), 10).with("c".to_owned(), 3);
        let keys: Vec<&str> = m.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(m.get("a"), Some(&10));
    }

    #[test]
    fn noop_with_and_without_are_identity() {
        let m = sample();
        assert!(m.with("a".to_owned(), 1).same_storage(&m));
        assert!(m.without("zz").same_storage(&m));
        assert!(!m.without("a").same_storage(&m));
    }

    #[test]
    fn equality_ignores_order() {
        let fwd = sample();
        let rev: ConstMap<String, i32> = [("b".to_owned(), 2), ("a".to_owned(), 1)]
            .into_iter()
            .collect();
        assert_eq!(fwd, rev);
    }
}
