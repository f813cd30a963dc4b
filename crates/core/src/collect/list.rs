use std::fmt;
use std::sync::Arc;

/// An immutable ordered sequence. `with`/`without` return new lists;
/// a `without` of an absent element returns a handle to the same
/// underlying storage.
pub struct ConstList<T> {
    items: Arc<Vec<T>>,
}

impl<T> ConstList<T> {
    pub fn empty() -> ConstList<T> {
        ConstList {
            items: Arc::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Whether two handles view the same underlying storage. This is the
    /// observable form of the no-op identity guarantee.
    pub fn same_storage(&self, other: &ConstList<T>) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: Clone> ConstList<T> {
    /// A new list with `item` appended.
    pub fn with(&self, item: T) -> ConstList<T> {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend_from_slice(&self.items);
        items.push(item);
        ConstList {
            items: Arc::new(items),
        }
    }
}

impl<T: Clone + PartialEq> ConstList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// A new list with the first occurrence of `item` removed, or this
    /// same list when `item` is absent.
    pub fn without(&self, item: &T) -> ConstList<T> {
        match self.items.iter().position(|x| x == item) {
            None => self.clone(),
            Some(at) => {
                let mut items: Vec<T> = self.items.as_ref().clone();
                items.remove(at);
                ConstList {
                    items: Arc::new(items),
                }
            }
        }
    }
}

impl<T> Clone for ConstList<T> {
    fn clone(&self) -> ConstList<T> {
        ConstList {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ConstList<T> {
    fn default() -> ConstList<T> {
        ConstList::empty()
    }
}

impl<T: PartialEq> PartialEq for ConstList<T> {
    fn eq(&self, other: &ConstList<T>) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for ConstList<T> {}

impl<T: fmt::Debug> fmt::Debug for ConstList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> From<Vec<T>> for ConstList<T> {
    fn from(items: Vec<T>) -> ConstList<T> {
        ConstList {
            items: Arc::new(items),
        }
    }
}

impl<T> FromIterator<T> for ConstList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> ConstList<T> {
        ConstList::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<'a, T> IntoIterator for &'a ConstList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_appends_without_removes_first() {
        let l: ConstList<i32> = ConstList::from(vec![1, 2, 2, 3]);
        let grown = l.with(4);
        assert_eq!(grown.as_slice(), &[1, 2, 2, 3, 4]);
        assert_eq!(l.len(), 4);

        let shrunk = grown.without(&2);
        assert_eq!(shrunk.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn without_absent_is_identity() {
        let l: ConstList<i32> = ConstList::from(vec![1, 2, 3]);
        let same = l.without(&9);
        assert!(same.same_storage(&l));
    }
}
