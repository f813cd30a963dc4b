use std::sync::Arc;

use crate::collect::ConstMap;
use crate::error::GrainError;
use crate::value::Value;

use super::grain::Grain;
use super::schema::GrainSchema;

/// The mutable counterpart of [`Grain`]. A builder belongs to a single
/// logical owner; `build` snapshots the current contents, so a builder can
/// keep mutating after producing a grain without disturbing it.
pub struct GrainBuilder {
    schema: Arc<GrainSchema>,
    basis: Vec<Value>,
    extensions: Vec<(String, Value)>,
}

impl GrainBuilder {
    /// A fresh builder: every basis slot `Null`, no extensions.
    pub fn new(schema: Arc<GrainSchema>) -> GrainBuilder {
        let basis = vec![Value::Null; schema.basis_len()];
        GrainBuilder {
            schema,
            basis,
            extensions: Vec::new(),
        }
    }

    /// A builder pre-populated from an existing grain.
    pub fn of(grain: &Grain) -> GrainBuilder {
        let schema = Arc::clone(grain.schema_arc());
        let mut basis = Vec::with_capacity(schema.basis_len());
        let mut extensions = Vec::new();
        for (i, (key, value)) in grain.iter().enumerate() {
            if i < schema.basis_len() {
                basis.push(value.clone());
            } else {
                extensions.push((key.to_owned(), value.clone()));
            }
        }
        GrainBuilder {
            schema,
            basis,
            extensions,
        }
    }

    pub fn schema(&self) -> &GrainSchema {
        &self.schema
    }

    pub fn size(&self) -> usize {
        self.basis.len() + self.extensions.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.schema.slot(key) {
            Some(at) => Some(&self.basis[at]),
            None => self
                .extensions
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.schema.is_basis(key) || self.extensions.iter().any(|(k, _)| k == key)
    }

    /// Associates `key` with `value`: basis keys assign their slot, other
    /// keys upsert into extensions keeping first-insertion position.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut GrainBuilder {
        let key = key.into();
        let value = value.into();
        match self.schema.slot(&key) {
            Some(at) => self.basis[at] = value,
            None => match self.extensions.iter().position(|(k, _)| *k == key) {
                Some(at) => self.extensions[at].1 = value,
                None => self.extensions.push((key, value)),
            },
        }
        self
    }

    pub fn put_all<I, K, V>(&mut self, entries: I) -> &mut GrainBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in entries {
            self.put(k, v);
        }
        self
    }

    /// Removes `key`: a basis slot resets to `Null`, an extension pair is
    /// deleted.
    pub fn remove(&mut self, key: &str) -> &mut GrainBuilder {
        match self.schema.slot(key) {
            Some(at) => self.basis[at] = Value::Null,
            None => {
                if let Some(at) = self.extensions.iter().position(|(k, _)| k == key) {
                    self.extensions.remove(at);
                }
            }
        }
        self
    }

    /// Back to the fresh state: all basis slots `Null`, extensions gone.
    pub fn clear(&mut self) -> &mut GrainBuilder {
        self.basis.fill(Value::Null);
        self.extensions.clear();
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let basis = self
            .basis
            .iter()
            .enumerate()
            .map(|(i, v)| (self.schema.properties()[i].name(), v));
        let extensions = self.extensions.iter().map(|(k, v)| (k.as_str(), v));
        basis.chain(extensions)
    }

    /// Snapshots the current contents into an immutable grain. The builder
    /// stays usable; later mutation does not affect the snapshot.
    pub fn build(&self) -> Grain {
        let basis: Arc<[Value]> = self.basis.clone().into();
        let extensions: ConstMap<String, Value> = self
            .extensions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Grain::from_parts(Arc::clone(&self.schema), basis, extensions)
    }

    /// A mutating cursor over the entries. The cursor borrows the builder
    /// exclusively, so the builder cannot be structurally changed behind
    /// the cursor's back while it lives.
    pub fn cursor_mut(&mut self) -> BuilderCursor<'_> {
        BuilderCursor {
            builder: self,
            at: None,
            next: 0,
        }
    }

    fn entry_at(&self, index: usize) -> Option<(&str, &Value)> {
        if index < self.basis.len() {
            Some((self.schema.properties()[index].name(), &self.basis[index]))
        } else {
            self.extensions
                .get(index - self.basis.len())
                .map(|(k, v)| (k.as_str(), v))
        }
    }
}

/// A cursor that walks a builder's entries and can rewrite or remove the
/// entry it is positioned on.
pub struct BuilderCursor<'a> {
    builder: &'a mut GrainBuilder,
    at: Option<usize>,
    next: usize,
}

impl BuilderCursor<'_> {
    pub fn has_next(&self) -> bool {
        self.next < self.builder.size()
    }

    /// Advances to the next entry and returns its key and value.
    pub fn next_entry(&mut self) -> Result<(&str, &Value), GrainError> {
        if self.next >= self.builder.size() {
            return Err(GrainError::IteratorExhausted);
        }
        self.at = Some(self.next);
        self.next += 1;
        // SAFETY: position checked against size above
        Ok(self.builder.entry_at(self.next - 1).unwrap())
    }

    pub fn key(&self) -> Result<&str, GrainError> {
        let at = self.at.ok_or(GrainError::CursorNotPositioned)?;
        // SAFETY: `at` was a yielded position; removal clears `at`
        Ok(self.builder.entry_at(at).unwrap().0)
    }

    pub fn value(&self) -> Result<&Value, GrainError> {
        let at = self.at.ok_or(GrainError::CursorNotPositioned)?;
        // SAFETY: `at` was a yielded position; removal clears `at`
        Ok(self.builder.entry_at(at).unwrap().1)
    }

    /// Replaces the value of the entry the cursor is positioned on.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), GrainError> {
        let at = self.at.ok_or(GrainError::CursorNotPositioned)?;
        let basis_len = self.builder.basis.len();
        if at < basis_len {
            self.builder.basis[at] = value.into();
        } else {
            self.builder.extensions[at - basis_len].1 = value.into();
        }
        Ok(())
    }

    /// Removes the entry the cursor is positioned on: a basis slot resets
    /// to `Null` and stays current, an extension entry is deleted and the
    /// cursor is no longer positioned until the next advance.
    pub fn remove(&mut self) -> Result<(), GrainError> {
        let at = self.at.ok_or(GrainError::CursorNotPositioned)?;
        let basis_len = self.builder.basis.len();
        if at < basis_len {
            self.builder.basis[at] = Value::Null;
        } else {
            self.builder.extensions.remove(at - basis_len);
            self.at = None;
            self.next -= 1;
        }
        Ok(())
    }
}
