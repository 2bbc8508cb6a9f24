//! Fixed-depth trace of reporting tasks.

use crate::registry::TaskId;

/// Default trace depth.
pub const TRACE_DEPTH: usize = 32;

/// Most-recent-first record of the last `K` reporting tasks.
///
/// Inserting shifts every entry one slot toward the tail and drops the
/// oldest once the buffer is full. The storage is inline, so pushes never
/// allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceBuffer<const K: usize = TRACE_DEPTH> {
    entries: [TaskId; K],
    len: usize,
}

impl<const K: usize> Default for TraceBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const K: usize> TraceBuffer<K> {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [TaskId::new(0); K],
            len: 0,
        }
    }

    /// Insert `task` as the most recent entry.
    pub fn push(&mut self, task: TaskId) {
        let Some(head) = K.checked_sub(1) else {
            return;
        };
        self.entries.copy_within(..head, 1);
        if let Some(first) = self.entries.first_mut() {
            *first = task;
        }
        self.len = self.len.saturating_add(1).min(K);
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = TaskId> + '_ {
        self.entries.iter().take(self.len).copied()
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<TaskId> {
        self.iter().next()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        K
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Copy the entries out, most recent first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TaskId> {
        self.iter().collect()
    }
}
