//! Append-only transcript store.
//!
//! Entries are never removed; they are mutated in place by identifier and
//! keep arrival order.

use chrono::Utc;

use crate::entry::{EntryBody, EntryId, TranscriptEntry};

#[derive(Debug, Default)]
pub struct TranscriptStore {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, body: EntryBody) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        let now = Utc::now();
        self.entries.push(TranscriptEntry {
            id,
            label: label.into(),
            body,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Mutate one entry in place. Returns `false` for an unknown id.
    pub fn update(&mut self, id: EntryId, f: impl FnOnce(&mut TranscriptEntry)) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        f(entry);
        entry.updated_at = Utc::now();
        true
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut TranscriptEntry> {
        self.position(id).map(|idx| &mut self.entries[idx])
    }

    // ids are assigned in push order, so the list is sorted by id
    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
