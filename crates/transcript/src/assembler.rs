//! Incremental transcript assembler.
//!
//! Consumes one SSE frame at a time, in arrival order, and keeps a
//! display-ready transcript current while the stream is still arriving.
//! Malformed or unexpected frames never fail the run: they are logged and
//! dropped.

use bops_core::{
    AssemblerConfig, MessageType, StatusEvent, StreamEvent, StreamMessage, decode_frame,
    decode_stream_finish,
};
use serde::Serialize;
use tracing::{debug, trace};
use ulid::Ulid;

use crate::correlator::StreamCorrelator;
use crate::delta::DeltaAccumulator;
use crate::entry::{CallStatus, EntryId, TranscriptEntry};
use crate::lifecycle::CallTracker;
use crate::projector::{RunOutcome, project_card, project_error, project_result};
use crate::store::TranscriptStore;

/// What a single frame did to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Entries created or updated by the frame.
    Applied(Vec<EntryId>),
    /// Decoded, but without transcript-visible effect.
    Ignored,
    /// No data, or the payload failed to decode.
    Dropped,
}

/// Frame counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblerStats {
    pub applied: usize,
    pub ignored: usize,
    pub dropped: usize,
}

/// Transcript assembler for one run.
///
/// All correlation state is owned by the instance; independent runs use
/// independent assemblers.
#[derive(Debug)]
pub struct TranscriptAssembler {
    session_id: Ulid,
    config: AssemblerConfig,
    store: TranscriptStore,
    deltas: DeltaAccumulator,
    calls: CallTracker,
    streams: StreamCorrelator,
    outcome: Option<RunOutcome>,
    last_status: Option<StatusEvent>,
    saw_stream_running: bool,
    saw_stream_finish: bool,
    stats: AssemblerStats,
}

impl Default for TranscriptAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl TranscriptAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            session_id: Ulid::new(),
            config,
            store: TranscriptStore::new(),
            deltas: DeltaAccumulator::new(),
            calls: CallTracker::new(),
            streams: StreamCorrelator::new(),
            outcome: None,
            last_status: None,
            saw_stream_running: false,
            saw_stream_finish: false,
            stats: AssemblerStats::default(),
        }
    }

    /// Feed one raw frame (event/data lines, without the blank terminator).
    pub fn push_frame(&mut self, raw: &str) -> FrameOutcome {
        match decode_frame(raw) {
            Ok(Some(event)) => self.push_event(event),
            Ok(None) => {
                trace!(session = %self.session_id, "frame without data");
                self.record(FrameOutcome::Dropped)
            }
            Err(err) => {
                debug!(session = %self.session_id, error = %err, "dropping malformed frame");
                self.record(FrameOutcome::Dropped)
            }
        }
    }

    /// Feed one already-decoded event.
    pub fn push_event(&mut self, event: StreamEvent) -> FrameOutcome {
        trace!(session = %self.session_id, event = event.name(), "frame");
        let outcome = match event {
            StreamEvent::Status(status) => {
                self.last_status = Some(status);
                FrameOutcome::Ignored
            }
            StreamEvent::Message(msg) if msg.kind == MessageType::Verbose => {
                self.on_verbose(&msg)
            }
            StreamEvent::Message(msg) => self.on_call(&msg),
            StreamEvent::Delta(delta) => {
                let label = self.config.assistant_label.as_str();
                match self
                    .deltas
                    .append(&mut self.store, delta.channel, &delta.content, label)
                {
                    Some(id) => FrameOutcome::Applied(vec![id]),
                    None => FrameOutcome::Ignored,
                }
            }
            StreamEvent::Card(card) => {
                FrameOutcome::Applied(vec![project_card(&mut self.store, &card, &self.config.card_label)])
            }
            StreamEvent::Result(result) => {
                if self.config.rotate_on_result {
                    self.deltas.close();
                }
                self.outcome = Some(RunOutcome::from(result.as_ref()));
                let created = project_result(&mut self.store, &result);
                if created.is_empty() {
                    FrameOutcome::Ignored
                } else {
                    FrameOutcome::Applied(created)
                }
            }
            StreamEvent::Error(error) => {
                match project_error(&mut self.store, &error, &self.config.error_label) {
                    Some(id) => FrameOutcome::Applied(vec![id]),
                    None => FrameOutcome::Ignored,
                }
            }
            StreamEvent::Other { event, .. } => {
                debug!(session = %self.session_id, event = %event, "ignoring unknown event");
                FrameOutcome::Ignored
            }
        };
        self.record(outcome)
    }

    fn on_call(&mut self, msg: &StreamMessage) -> FrameOutcome {
        let Some(observed) = self.calls.observe(&mut self.store, msg, &self.config) else {
            return FrameOutcome::Ignored;
        };
        if let Some(uuid) = observed.stream_uuid {
            if observed.status == CallStatus::Running {
                self.saw_stream_running = true;
            }
            self.streams.register(uuid, observed.entry);
        }
        FrameOutcome::Applied(vec![observed.entry])
    }

    fn on_verbose(&mut self, msg: &StreamMessage) -> FrameOutcome {
        let finish = match decode_stream_finish(msg) {
            Ok(finish) => finish,
            Err(reason) => {
                debug!(session = %self.session_id, %reason, "ignoring verbose message");
                return FrameOutcome::Ignored;
            }
        };
        match self.streams.resolve(&mut self.store, &finish) {
            Some(entry) => {
                self.saw_stream_finish = true;
                FrameOutcome::Applied(vec![entry])
            }
            None => {
                debug!(session = %self.session_id, uuid = %finish.uuid, "stream finish without owner");
                FrameOutcome::Ignored
            }
        }
    }

    fn record(&mut self, outcome: FrameOutcome) -> FrameOutcome {
        match &outcome {
            FrameOutcome::Applied(_) => self.stats.applied += 1,
            FrameOutcome::Ignored => self.stats.ignored += 1,
            FrameOutcome::Dropped => self.stats.dropped += 1,
        }
        outcome
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn entries(&self) -> &[TranscriptEntry] {
        self.store.entries()
    }

    pub fn entry(&self, id: EntryId) -> Option<&TranscriptEntry> {
        self.store.get(id)
    }

    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.store.into_entries()
    }

    pub fn session_id(&self) -> Ulid {
        self.session_id
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Conversational entry currently receiving deltas.
    pub fn live_entry(&self) -> Option<EntryId> {
        self.deltas.live()
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_status(&self) -> Option<&StatusEvent> {
        self.last_status.as_ref()
    }

    /// A streaming sub-tool was observed running.
    pub fn saw_stream_running(&self) -> bool {
        self.saw_stream_running
    }

    /// A stream-finish notification resolved to an entry.
    pub fn saw_stream_finish(&self) -> bool {
        self.saw_stream_finish
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }
}
