//! Delta accumulator: routes answer/reasoning fragments into the open
//! conversational entry.

use bops_core::DeltaChannel;

use crate::entry::{EntryBody, EntryId};
use crate::store::TranscriptStore;

/// Tracks the single conversational entry currently open for streaming.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    live: Option<EntryId>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to the channel's buffer, opening an entry on first use.
    ///
    /// Empty text and unknown channels never create or touch an entry.
    pub fn append(
        &mut self,
        store: &mut TranscriptStore,
        channel: DeltaChannel,
        text: &str,
        label: &str,
    ) -> Option<EntryId> {
        if text.is_empty() || channel == DeltaChannel::Unknown {
            return None;
        }
        let id = match self.live {
            Some(id) => id,
            None => {
                let id = store.push(label, EntryBody::conversational());
                self.live = Some(id);
                id
            }
        };
        store.update(id, |entry| {
            if let EntryBody::Conversational { body, reasoning } = &mut entry.body {
                match channel {
                    DeltaChannel::Answer => body.push_str(text),
                    DeltaChannel::Reasoning => reasoning.push_str(text),
                    DeltaChannel::Unknown => {}
                }
            }
        });
        Some(id)
    }

    /// Close the open entry; the next delta opens a fresh one.
    pub fn close(&mut self) -> Option<EntryId> {
        self.live.take()
    }

    pub fn live(&self) -> Option<EntryId> {
        self.live
    }
}
