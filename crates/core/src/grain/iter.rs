use crate::error::GrainError;
use crate::value::Value;

use super::grain::Grain;

/// Plain iterator over a grain's entries, basis first.
pub struct GrainIter<'a> {
    grain: &'a Grain,
    next: usize,
}

impl<'a> GrainIter<'a> {
    pub(super) fn new(grain: &'a Grain) -> GrainIter<'a> {
        GrainIter { grain, next: 0 }
    }
}

impl<'a> Iterator for GrainIter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<(&'a str, &'a Value)> {
        let entry = self.grain.entry_at(self.next)?;
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grain.size().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GrainIter<'_> {}

/// A checked cursor over a grain's entries. `next_entry` advances and
/// fails once the entries run out; `key`/`value` read the current entry
/// and need no prior `has_next` call.
pub struct GrainCursor<'a> {
    grain: &'a Grain,
    at: Option<usize>,
    next: usize,
}

impl<'a> GrainCursor<'a> {
    pub(super) fn new(grain: &'a Grain) -> GrainCursor<'a> {
        GrainCursor {
            grain,
            at: None,
            next: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next < self.grain.size()
    }

    /// Advances to the next entry and returns it.
    pub fn next_entry(&mut self) -> Result<(&'a str, &'a Value), GrainError> {
        match self.grain.entry_at(self.next) {
            Some(entry) => {
                self.at = Some(self.next);
                self.next += 1;
                Ok(entry)
            }
            None => Err(GrainError::IteratorExhausted),
        }
    }

    /// The key of the entry the cursor is positioned on.
    pub fn key(&self) -> Result<&'a str, GrainError> {
        self.current().map(|(k, _)| k)
    }

    /// The value of the entry the cursor is positioned on.
    pub fn value(&self) -> Result<&'a Value, GrainError> {
        self.current().map(|(_, v)| v)
    }

    fn current(&self) -> Result<(&'a str, &'a Value), GrainError> {
        let at = self.at.ok_or(GrainError::CursorNotPositioned)?;
        // SAFETY: `at` was a yielded position and the grain is immutable
        Ok(self.grain.entry_at(at).unwrap())
    }
}
