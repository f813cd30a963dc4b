use std::fmt;
use std::sync::Arc;

use crate::collect::{ConstList, ConstMap, ConstSet};
use crate::value::Value;

use super::iter::{GrainCursor, GrainIter};
use super::schema::GrainSchema;

/// An immutable structural record: a fixed, schema-ordered *basis* of
/// key→value slots plus insertion-ordered open *extensions*.
///
/// Basis keys are always present; a removed basis value shows as
/// [`Value::Null`] without changing [`size`](Grain::size). Extension keys
/// come and go. All derived views and `with`/`without` results share
/// storage with their source wherever the operation changed nothing.
pub struct Grain {
    schema: Arc<GrainSchema>,
    basis: Arc<[Value]>,
    extensions: ConstMap<String, Value>,
}

impl Grain {
    pub(super) fn from_parts(
        schema: Arc<GrainSchema>,
        basis: Arc<[Value]>,
        extensions: ConstMap<String, Value>,
    ) -> Grain {
        debug_assert_eq!(basis.len(), schema.basis_len());
        Grain {
            schema,
            basis,
            extensions,
        }
    }

    pub fn schema(&self) -> &GrainSchema {
        &self.schema
    }

    pub(super) fn schema_arc(&self) -> &Arc<GrainSchema> {
        &self.schema
    }

    /// Basis slot count plus extension count.
    pub fn size(&self) -> usize {
        self.basis.len() + self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Looks a key up in either partition. A basis key whose value was
    /// removed yields `Some(&Value::Null)`; an absent extension key yields
    /// `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.schema.slot(key) {
            Some(at) => Some(&self.basis[at]),
            None => self.extensions.get(key),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.schema.is_basis(key) || self.extensions.contains_key(key)
    }

    /// The extension sub-map, excluding all basis pairs.
    pub fn extensions(&self) -> ConstMap<String, Value> {
        self.extensions.clone()
    }

    /// A new grain with `key` associated to `value`: a basis key replaces
    /// its slot, anything else lands in extensions.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Grain {
        let key = key.into();
        let value = value.into();
        match self.schema.slot(&key) {
            Some(at) => {
                if self.basis[at] == value {
                    return self.clone();
                }
                let mut basis: Vec<Value> = self.basis.to_vec();
                basis[at] = value;
                Grain {
                    schema: Arc::clone(&self.schema),
                    basis: basis.into(),
                    extensions: self.extensions.clone(),
                }
            }
            None => Grain {
                schema: Arc::clone(&self.schema),
                basis: Arc::clone(&self.basis),
                extensions: self.extensions.with(key, value),
            },
        }
    }

    pub fn with_all<I, K, V>(&self, entries: I) -> Grain
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        entries
            .into_iter()
            .fold(self.clone(), |g, (k, v)| g.with(k, v))
    }

    /// A new grain lacking `key`: a basis slot resets to `Null` (size is
    /// preserved), an extension pair is removed outright.
    pub fn without(&self, key: &str) -> Grain {
        match self.schema.slot(key) {
            Some(at) => {
                if self.basis[at].is_null() {
                    return self.clone();
                }
                let mut basis: Vec<Value> = self.basis.to_vec();
                basis[at] = Value::Null;
                Grain {
                    schema: Arc::clone(&self.schema),
                    basis: basis.into(),
                    extensions: self.extensions.clone(),
                }
            }
            None => Grain {
                schema: Arc::clone(&self.schema),
                basis: Arc::clone(&self.basis),
                extensions: self.extensions.without(key),
            },
        }
    }

    pub fn without_all<'k, I: IntoIterator<Item = &'k str>>(&self, keys: I) -> Grain {
        keys.into_iter().fold(self.clone(), |g, k| g.without(k))
    }

    /// All keys, basis first, as a const set view.
    pub fn key_set(&self) -> ConstSet<String> {
        self.iter().map(|(k, _)| k.to_owned()).collect()
    }

    /// All values in iteration order, as a const list view.
    pub fn values(&self) -> ConstList<Value> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// All entries in iteration order, as a const map view.
    pub fn entries(&self) -> ConstMap<String, Value> {
        self.iter().map(|(k, v)| (k.to_owned(), v.clone())).collect()
    }

    /// The entry at `index` in iteration order: basis slots in declaration
    /// order, then extensions in insertion order.
    pub fn entry_at(&self, index: usize) -> Option<(&str, &Value)> {
        if index < self.basis.len() {
            let name = self.schema.properties()[index].name();
            Some((name, &self.basis[index]))
        } else {
            self.extensions
                .entry_at(index - self.basis.len())
                .map(|(k, v)| (k.as_str(), v))
        }
    }

    pub fn iter(&self) -> GrainIter<'_> {
        GrainIter::new(self)
    }

    /// The checked cursor form of [`iter`](Grain::iter), with explicit
    /// exhaustion errors.
    pub fn cursor(&self) -> GrainCursor<'_> {
        GrainCursor::new(self)
    }
}

impl Clone for Grain {
    fn clone(&self) -> Grain {
        Grain {
            schema: Arc::clone(&self.schema),
            basis: Arc::clone(&self.basis),
            extensions: self.extensions.clone(),
        }
    }
}

/// Equality is same schema plus same key→value pairs; extension order does
/// not matter.
impl PartialEq for Grain {
    fn eq(&self, other: &Grain) -> bool {
        self.schema.name() == other.schema.name()
            && self.basis == other.basis
            && self.extensions == other.extensions
    }
}

impl Eq for Grain {}

impl fmt::Debug for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for (k, v) in self.iter() {
            dbg.entry(&k, v);
        }
        dbg.finish()
    }
}

impl<'a> IntoIterator for &'a Grain {
    type Item = (&'a str, &'a Value);
    type IntoIter = GrainIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
