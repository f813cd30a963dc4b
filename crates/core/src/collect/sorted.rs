use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An immutable set ordered by `Ord`. Same `with`/`without` identity
/// guarantees as [`ConstSet`](super::ConstSet); iteration is ascending.
pub struct ConstSortedSet<T> {
    items: Arc<Vec<T>>,
}

impl<T> ConstSortedSet<T> {
    pub fn empty() -> ConstSortedSet<T> {
        ConstSortedSet {
            items: Arc::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn same_storage(&self, other: &ConstSortedSet<T>) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: Ord> ConstSortedSet<T> {
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.items
            .binary_search_by(|x| x.borrow().cmp(item))
            .is_ok()
    }
}

impl<T: Clone + Ord> ConstSortedSet<T> {
    pub fn with(&self, item: T) -> ConstSortedSet<T> {
        match self.items.binary_search(&item) {
            Ok(_) => self.clone(),
            Err(at) => {
                let mut items: Vec<T> = self.items.as_ref().clone();
                items.insert(at, item);
                ConstSortedSet {
                    items: Arc::new(items),
                }
            }
        }
    }

    pub fn without<Q>(&self, item: &Q) -> ConstSortedSet<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.items.binary_search_by(|x| x.borrow().cmp(item)) {
            Err(_) => self.clone(),
            Ok(at) => {
                let mut items: Vec<T> = self.items.as_ref().clone();
                items.remove(at);
                ConstSortedSet {
                    items: Arc::new(items),
                }
            }
        }
    }
}

impl<T> Clone for ConstSortedSet<T> {
    fn clone(&self) -> ConstSortedSet<T> {
        ConstSortedSet {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ConstSortedSet<T> {
    fn default() -> ConstSortedSet<T> {
        ConstSortedSet::empty()
    }
}

impl<T: PartialEq> PartialEq for ConstSortedSet<T> {
    fn eq(&self, other: &ConstSortedSet<T>) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for ConstSortedSet<T> {}

impl<T: fmt::Debug> fmt::Debug for ConstSortedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: Ord> FromIterator<T> for ConstSortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> ConstSortedSet<T> {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.sort();
        items.dedup();
        ConstSortedSet {
            items: Arc::new(items),
        }
    }
}

/// An immutable map ordered by key. Re-association and removal follow the
/// same identity rules as [`ConstMap`](super::ConstMap).
pub struct ConstSortedMap<K, V> {
    entries: Arc<Vec<(K, V)>>,
}

impl<K, V> ConstSortedMap<K, V> {
    pub fn empty() -> ConstSortedMap<K, V> {
        ConstSortedMap {
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

    pub fn same_storage(&self, other: &ConstSortedMap<K, V>) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K: Ord, V> ConstSortedMap<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries
            .binary_search_by(|(k, _)| k.borrow().cmp(key))
            .ok()
            .map(|at| &self.entries[at].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Clone + Ord, V: Clone + PartialEq> ConstSortedMap<K, V> {
    pub fn with(&self, key: K, value: V) -> ConstSortedMap<K, V> {
        match self.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(at) => {
                if self.entries[at].1 == value {
                    return self.clone();
                }
                let mut entries: Vec<(K, V)> = self.entries.as_ref().clone();
                entries[at].1 = value;
                ConstSortedMap {
                    entries: Arc::new(entries),
                }
            }
            Err(at) => {
                let mut entries: Vec<(K, V)> = self.entries.as_ref().clone();
                entries.insert(at, (key, value));
                ConstSortedMap {
                    entries: Arc::new(entries),
                }
            }
        }
    }

    pub fn without<Q>(&self, key: &Q) -> ConstSortedMap<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.entries.binary_search_by(|(k, _)| k.borrow().cmp(key)) {
            Err(_) => self.clone(),
            Ok(at) => {
                let mut entries: Vec<(K, V)> = self.entries.as_ref().clone();
                entries.remove(at);
                ConstSortedMap {
                    entries: Arc::new(entries),
                }
            }
        }
    }
}

impl<K, V> Clone for ConstSortedMap<K, V> {
    fn clone(&self) -> ConstSortedMap<K, V> {
        ConstSortedMap {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for ConstSortedMap<K, V> {
    fn default() -> ConstSortedMap<K, V> {
        ConstSortedMap::empty()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for ConstSortedMap<K, V> {
    fn eq(&self, other: &ConstSortedMap<K, V>) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq, V: Eq> Eq for ConstSortedMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ConstSortedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for ConstSortedMap<K, V> {
    /// A duplicated key keeps the last value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> ConstSortedMap<K, V> {
        let mut entries: Vec<(K, V)> = Vec::new();
        for (key, value) in iter {
            match entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                Ok(at) => entries[at].1 = value,
                Err(at) => entries.insert(at, (key, value)),
            }
        }
        ConstSortedMap {
            entries: Arc::new(entries),
        }
    }
}
