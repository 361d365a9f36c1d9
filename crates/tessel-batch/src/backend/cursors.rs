use std::collections::HashMap;

use crate::resource::{CursorHandle, MouseCursor};

/// Cursor objects keyed by filename; at most one per name.
#[derive(Default)]
pub(crate) struct CursorCache {
    by_name: HashMap<String, CursorHandle>,
    cursors: HashMap<CursorHandle, Box<dyn MouseCursor>>,
    next: u32,
    active: Option<CursorHandle>,
}

impl CursorCache {
    pub(crate) fn lookup(&self, filename: &str) -> Option<CursorHandle> {
        self.by_name.get(filename).copied()
    }

    pub(crate) fn insert(&mut self, filename: &str, cursor: Box<dyn MouseCursor>) -> CursorHandle {
        self.next += 1;
        let handle = CursorHandle::new(self.next);
        self.by_name.insert(filename.to_string(), handle);
        self.cursors.insert(handle, cursor);
        handle
    }

    /// Enables `handle`, disabling the previously active cursor.
    pub(crate) fn enable(&mut self, handle: CursorHandle) -> bool {
        if !self.cursors.contains_key(&handle) {
            return false;
        }
        if self.active != Some(handle) {
            self.disable();
        }
        if let Some(cursor) = self.cursors.get_mut(&handle) {
            cursor.enable();
        }
        self.active = Some(handle);
        true
    }

    pub(crate) fn disable(&mut self) {
        if let Some(cursor) = self.active.take().and_then(|h| self.cursors.get_mut(&h)) {
            cursor.disable();
        }
    }

    pub(crate) fn active(&self) -> Option<&dyn MouseCursor> {
        self.active.and_then(|h| self.cursors.get(&h)).map(|c| &**c)
    }

    pub(crate) fn len(&self) -> usize {
        self.cursors.len()
    }

    pub(crate) fn dispose_all(&mut self) {
        self.active = None;
        self.by_name.clear();
        for (_, mut cursor) in self.cursors.drain() {
            cursor.dispose();
        }
    }
}
