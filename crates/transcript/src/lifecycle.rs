//! Call lifecycle tracker.
//!
//! Maps a grouping key to the call-group entry that displays it. A call's
//! start and finish arrive as separate messages and collapse into one entry;
//! inside a loop every iteration gets its own entry.

use std::collections::HashMap;

use bops_core::{AssemblerConfig, StreamMessage};

use crate::entry::{CallStatus, CallUnit, EntryBody, EntryId};
use crate::store::TranscriptStore;

/// Identifier that selects the entry a call message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Call(String),
    Iteration { loop_id: String, iteration: u64 },
}

impl GroupKey {
    pub fn for_message(msg: &StreamMessage) -> Self {
        let extra = &msg.extra_info;
        match extra.iteration {
            Some(iteration) if !extra.loop_id.is_empty() => Self::Iteration {
                loop_id: extra.loop_id.clone(),
                iteration,
            },
            _ => Self::Call(msg.call_id().to_string()),
        }
    }
}

/// Effect of one call message on the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallObservation {
    pub entry: EntryId,
    pub status: CallStatus,
    /// Correlation token the owning entry must be registered under.
    pub stream_uuid: Option<String>,
    pub created: bool,
}

#[derive(Debug, Default)]
pub struct CallTracker {
    groups: HashMap<GroupKey, EntryId>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `function_call` / `tool_response` message.
    ///
    /// Returns `None` when the message was refused: a `running` state for a
    /// group that already finished, unless reopening is enabled.
    pub fn observe(
        &mut self,
        store: &mut TranscriptStore,
        msg: &StreamMessage,
        config: &AssemblerConfig,
    ) -> Option<CallObservation> {
        let key = GroupKey::for_message(msg);
        let unit = CallUnit::from_message(msg);
        let status = unit.status;
        let stream_uuid = unit.stream_uuid.clone();

        if let Some(&entry) = self.groups.get(&key) {
            let finished = store
                .get(entry)
                .and_then(|e| e.call())
                .is_some_and(|call| call.status.is_done());
            if finished && status == CallStatus::Running && !config.reopen_finished_calls {
                tracing::debug!(?key, entry = %entry, "ignoring running state for finished call");
                return None;
            }
            store.update(entry, |e| e.body = EntryBody::CallGroup { call: unit });
            return Some(CallObservation {
                entry,
                status,
                stream_uuid,
                created: false,
            });
        }

        let label = match &key {
            GroupKey::Iteration { iteration, .. } => config.round_label(*iteration),
            GroupKey::Call(_) => config.step_label.clone(),
        };
        let entry = store.push(label, EntryBody::CallGroup { call: unit });
        self.groups.insert(key, entry);
        Some(CallObservation {
            entry,
            status,
            stream_uuid,
            created: true,
        })
    }

    pub fn entry_for(&self, key: &GroupKey) -> Option<EntryId> {
        self.groups.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
