//! Linear undo/redo over immutable snapshots

/// Ordered snapshots plus a cursor pointing at the current one
///
/// Pushing after an undo discards the redo tail, so history never branches.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
}

impl<T: Clone> History<T> {
    /// Start with a single snapshot
    pub fn new(initial: T) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &T {
        // The cursor always indexes a live entry
        &self.entries[self.cursor]
    }

    /// Drop the redo tail, append `snapshot` and make it current
    pub fn push(&mut self, snapshot: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;
    }

    /// Edit the current snapshot in place; the redo tail is discarded too
    pub fn replace_current(&mut self, snapshot: T) {
        self.entries.truncate(self.cursor + 1);
        self.entries[self.cursor] = snapshot;
    }

    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}
