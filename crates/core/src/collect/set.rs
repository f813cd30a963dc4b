use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An immutable insertion-ordered set. Iteration yields elements in the
/// order they were first added. `with` of a present element and `without`
/// of an absent one both return a handle to the same underlying storage.
///
/// Membership is a linear scan; these sets hold grain keys and similar
/// small collections, not bulk data.
pub struct ConstSet<T> {
    items: Arc<Vec<T>>,
}

impl<T> ConstSet<T> {
    pub fn empty() -> ConstSet<T> {
        ConstSet {
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

    pub fn same_storage(&self, other: &ConstSet<T>) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: PartialEq> ConstSet<T> {
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.items.iter().any(|x| x.borrow() == item)
    }
}

impl<T: Clone + PartialEq> ConstSet<T> {
    /// A new set containing `item`, or this same set if already present.
    pub fn with(&self, item: T) -> ConstSet<T> {
        if self.items.contains(&item) {
            return self.clone();
        }
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend_from_slice(&self.items);
        items.push(item);
        ConstSet {
            items: Arc::new(items),
        }
    }

    /// A new set lacking `item`, or this same set if it was absent.
    pub fn without<Q>(&self, item: &Q) -> ConstSet<T>
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self.items.iter().position(|x| x.borrow() == item) {
            None => self.clone(),
            Some(at) => {
                let mut items: Vec<T> = self.items.as_ref().clone();
                items.remove(at);
                ConstSet {
                    items: Arc::new(items),
                }
            }
        }
    }
}

impl<T> Clone for ConstSet<T> {
    fn clone(&self) -> ConstSet<T> {
        ConstSet {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ConstSet<T> {
    fn default() -> ConstSet<T> {
        ConstSet::empty()
    }
}

/// Set equality is order-insensitive.
impl<T: PartialEq> PartialEq for ConstSet<T> {
    fn eq(&self, other: &ConstSet<T>) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|x| other.items.contains(x))
    }
}

impl<T: Eq> Eq for ConstSet<T> {}

impl<T: fmt::Debug> fmt::Debug for ConstSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: PartialEq> FromIterator<T> for ConstSet<T> {
    /// Duplicates collapse to the first occurrence.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> ConstSet<T> {
        let mut items: Vec<T> = Vec::new();
        for item in iter {
            if !items.contains(&item) {
                items.push(item);
            }
        }
        ConstSet {
            items: Arc::new(items),
        }
    }
}

impl<'a, T> IntoIterator for &'a ConstSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
