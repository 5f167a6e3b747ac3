use std::collections::HashSet;

use parking_lot::Mutex;

/// Set of names that remembers the last batch it was given.
///
/// Used to find entries that disappeared between two policy documents.
#[derive(Debug, Default)]
pub struct ThreadSafeSet {
    inner: Mutex<HashSet<String>>,
}

impl ThreadSafeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tracked names with `next` and returns the names that were
    /// tracked before but are absent from `next`.
    pub fn diff_and_emplace(
        &self,
        next: HashSet<String>,
    ) -> Vec<String> {
        let mut current = self.inner.lock();
        let removed = current.difference(&next).cloned().collect();
        *current = next;
        removed
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.inner.lock().contains(name)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
