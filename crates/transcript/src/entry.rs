//! Transcript entries: the unit of display.

use std::fmt;

use bops_core::{ExecuteDisplayName, MessageType, StreamMessage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Stable identifier of an entry, assigned in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Conversational,
    CallGroup,
    Card,
    Auxiliary,
}

/// What an auxiliary entry holds; downstream rendering keys off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryTopic {
    Plan,
    SubagentSummaries,
    Error,
}

/// Kind-specific content of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryBody {
    /// Streamed answer and reasoning text, two independent buffers.
    Conversational { body: String, reasoning: String },
    /// Latest known state of one call; replaced wholesale on update.
    CallGroup { call: CallUnit },
    Card {
        card_type: Option<String>,
        card: Value,
    },
    Auxiliary {
        topic: AuxiliaryTopic,
        items: Vec<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl EntryBody {
    pub fn conversational() -> Self {
        Self::Conversational {
            body: String::new(),
            reasoning: String::new(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Conversational { .. } => EntryKind::Conversational,
            Self::CallGroup { .. } => EntryKind::CallGroup,
            Self::Card { .. } => EntryKind::Card,
            Self::Auxiliary { .. } => EntryKind::Auxiliary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub label: String,
    #[serde(flatten)]
    pub body: EntryBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn kind(&self) -> EntryKind {
        self.body.kind()
    }

    /// Accumulated answer text; empty for non-conversational entries.
    pub fn body_text(&self) -> &str {
        match &self.body {
            EntryBody::Conversational { body, .. } => body,
            _ => "",
        }
    }

    pub fn reasoning(&self) -> &str {
        match &self.body {
            EntryBody::Conversational { reasoning, .. } => reasoning,
            _ => "",
        }
    }

    pub fn call(&self) -> Option<&CallUnit> {
        match &self.body {
            EntryBody::CallGroup { call } => Some(call),
            _ => None,
        }
    }

    pub fn call_mut(&mut self) -> Option<&mut CallUnit> {
        match &mut self.body {
            EntryBody::CallGroup { call } => Some(call),
            _ => None,
        }
    }

    pub fn card(&self) -> Option<&Value> {
        match &self.body {
            EntryBody::Card { card, .. } => Some(card),
            _ => None,
        }
    }

    pub fn card_type(&self) -> Option<&str> {
        match &self.body {
            EntryBody::Card { card_type, .. } => card_type.as_deref(),
            _ => None,
        }
    }

    pub fn topic(&self) -> Option<AuxiliaryTopic> {
        match &self.body {
            EntryBody::Auxiliary { topic, .. } => Some(*topic),
            _ => None,
        }
    }
}

// ── Call units ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Running,
    Done,
}

impl CallStatus {
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Agent that issued a call in a multi-agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    pub role: String,
}

const PLUGIN_STATUS_FAILED: &str = "1";

/// Latest known state of one function/tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallUnit {
    pub call_id: String,
    pub title: String,
    pub status: CallStatus,
    pub content: String,
    pub stream_uuid: Option<String>,
    pub loop_id: Option<String>,
    pub iteration: Option<u64>,
    pub message_id: String,
    pub plugin_status: Option<String>,
    pub agent: Option<AgentIdentity>,
    #[serde(skip)]
    display: Option<ExecuteDisplayName>,
}

impl CallUnit {
    /// Derive the unit a `function_call` / `tool_response` message describes.
    pub fn from_message(msg: &StreamMessage) -> Self {
        let extra = &msg.extra_info;
        let running = match msg.kind {
            MessageType::FunctionCall => true,
            MessageType::ToolResponse => !msg.finished(),
            _ => false,
        };
        let agent = if extra.agent_id.is_empty() && extra.agent_name.is_empty() {
            None
        } else {
            Some(AgentIdentity {
                id: extra.agent_id.clone(),
                name: extra.agent_name.clone(),
                role: extra.agent_role.clone(),
            })
        };
        let mut unit = Self {
            call_id: msg.call_id().to_string(),
            title: String::new(),
            status: if running {
                CallStatus::Running
            } else {
                CallStatus::Done
            },
            content: msg.content.clone(),
            stream_uuid: non_empty(&extra.stream_plugin_running),
            loop_id: non_empty(&extra.loop_id),
            iteration: extra.iteration,
            message_id: msg.message_id.clone(),
            plugin_status: non_empty(&extra.plugin_status),
            agent,
            display: ExecuteDisplayName::parse(&extra.execute_display_name),
        };
        unit.title = unit.default_title();
        unit.refresh_title();
        unit
    }

    /// Close the unit from a stream-finish notification. Without a reported
    /// output the previous content is kept.
    pub fn finish(&mut self, output: Option<&str>) {
        self.status = CallStatus::Done;
        if let Some(output) = output {
            self.content = output.to_string();
        }
        self.refresh_title();
    }

    fn default_title(&self) -> String {
        if self.content.is_empty() {
            self.call_id.clone()
        } else {
            self.content.clone()
        }
    }

    fn refresh_title(&mut self) {
        let Some(display) = &self.display else {
            return;
        };
        let failed = self.failed();
        let name = match self.status {
            CallStatus::Running => &display.name_executing,
            CallStatus::Done if failed && !display.name_execute_failed.is_empty() => {
                &display.name_execute_failed
            }
            CallStatus::Done => &display.name_executed,
        };
        if !name.is_empty() {
            self.title = name.clone();
        }
    }

    /// Producer reports a failed plugin run with `plugin_status` "1".
    pub fn failed(&self) -> bool {
        self.plugin_status.as_deref() == Some(PLUGIN_STATUS_FAILED)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
