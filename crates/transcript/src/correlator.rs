//! Stream correlator.
//!
//! A long-running sub-tool announces an opaque uuid while running and only
//! reports its output later, through a verbose stream-finish notification.
//! The correlator remembers which entry owns each uuid.

use std::collections::HashMap;

use bops_core::StreamFinish;

use crate::entry::EntryId;
use crate::store::TranscriptStore;

#[derive(Debug, Default)]
pub struct StreamCorrelator {
    owners: HashMap<String, EntryId>,
}

impl StreamCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `uuid` against `entry`. The latest registration wins.
    pub fn register(&mut self, uuid: impl Into<String>, entry: EntryId) {
        self.owners.insert(uuid.into(), entry);
    }

    pub fn owner(&self, uuid: &str) -> Option<EntryId> {
        self.owners.get(uuid).copied()
    }

    /// Close the call owned by the finished stream.
    ///
    /// Returns `None` when no entry ever registered the uuid.
    pub fn resolve(&self, store: &mut TranscriptStore, finish: &StreamFinish) -> Option<EntryId> {
        let entry = self.owner(&finish.uuid)?;
        store.update(entry, |e| {
            if let Some(call) = e.call_mut() {
                call.finish(finish.output.as_deref());
            }
        });
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
