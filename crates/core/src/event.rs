//! Typed payloads for the agent workflow event stream.
//!
//! Every field is defaulted: the producer is allowed to omit anything, and a
//! missing field is treated as absence rather than as a decoding failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const EVENT_STATUS: &str = "status";
pub const EVENT_MESSAGE: &str = "message";
pub const EVENT_DELTA: &str = "delta";
pub const EVENT_CARD: &str = "card";
pub const EVENT_RESULT: &str = "result";
pub const EVENT_ERROR: &str = "error";

/// One decoded frame, dispatched by event name.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Status(StatusEvent),
    Message(StreamMessage),
    Delta(DeltaEvent),
    Card(CardEvent),
    Result(Box<ResultEvent>),
    Error(ErrorEvent),
    /// Event name this build does not know about.
    Other { event: String, payload: Value },
}

impl StreamEvent {
    /// Decode a payload string for the given event name.
    pub fn from_parts(event: &str, data: &str) -> Result<Self, serde_json::Error> {
        Ok(match event {
            EVENT_STATUS => Self::Status(serde_json::from_str(data)?),
            EVENT_MESSAGE => Self::Message(serde_json::from_str(data)?),
            EVENT_DELTA => Self::Delta(serde_json::from_str(data)?),
            EVENT_CARD => Self::Card(CardEvent::from_payload(serde_json::from_str(data)?)),
            EVENT_RESULT => Self::Result(Box::new(serde_json::from_str(data)?)),
            EVENT_ERROR => Self::Error(serde_json::from_str(data)?),
            other => Self::Other {
                event: other.to_string(),
                payload: serde_json::from_str(data)?,
            },
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Status(_) => EVENT_STATUS,
            Self::Message(_) => EVENT_MESSAGE,
            Self::Delta(_) => EVENT_DELTA,
            Self::Card(_) => EVENT_CARD,
            Self::Result(_) => EVENT_RESULT,
            Self::Error(_) => EVENT_ERROR,
            Self::Other { event, .. } => event,
        }
    }
}

// ── status ──────────────────────────────────────────────────────────

/// Workflow node progress notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusEvent {
    #[serde(deserialize_with = "string_or_empty")]
    pub node: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub status: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub message: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub call_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub display_name: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub stage: String,
}

// ── message ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    FunctionCall,
    ToolResponse,
    Verbose,
    #[default]
    #[serde(other)]
    Other,
}

/// A `message` frame: function call lifecycle or verbose side-channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamMessage {
    #[serde(deserialize_with = "string_or_empty")]
    pub message_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub reply_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub role: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: MessageType,
    #[serde(deserialize_with = "string_or_empty")]
    pub content: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub reasoning_content: String,
    /// Only an actual JSON boolean counts; anything else is "not provided".
    #[serde(deserialize_with = "bool_or_none")]
    pub is_finish: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub index: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub extra_info: MessageExtra,
}

impl StreamMessage {
    /// Explicit finish flag, otherwise finished unless this is a `function_call`.
    pub fn finished(&self) -> bool {
        self.is_finish
            .unwrap_or(self.kind != MessageType::FunctionCall)
    }

    /// Call identifier, falling back to the frame's own message id.
    pub fn call_id(&self) -> &str {
        if self.extra_info.call_id.is_empty() {
            &self.message_id
        } else {
            &self.extra_info.call_id
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageExtra {
    #[serde(deserialize_with = "string_or_empty")]
    pub call_id: String,
    /// Nested JSON string, see [`ExecuteDisplayName`].
    #[serde(deserialize_with = "string_or_empty")]
    pub execute_display_name: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub plugin_status: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub message_title: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub stream_plugin_running: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub loop_id: String,
    #[serde(deserialize_with = "u64_or_none")]
    pub iteration: Option<u64>,
    #[serde(deserialize_with = "string_or_empty")]
    pub agent_status: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub agent_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub agent_name: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub agent_role: String,
}

/// Display names the producer attaches to a call for each lifecycle phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteDisplayName {
    #[serde(deserialize_with = "string_or_empty")]
    pub name_executing: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub name_executed: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub name_execute_failed: String,
}

impl ExecuteDisplayName {
    /// Decode the nested JSON string; `None` when empty or malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        serde_json::from_str(raw).ok()
    }
}

// ── delta ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaChannel {
    Answer,
    Reasoning,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Incremental text on one of the two conversational channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub channel: DeltaChannel,
    #[serde(deserialize_with = "string_or_empty")]
    pub content: String,
}

// ── card ────────────────────────────────────────────────────────────

/// Opaque structured card; only `card_type` is surfaced.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEvent {
    pub card_type: Option<String>,
    pub payload: Value,
}

impl CardEvent {
    pub fn from_payload(payload: Value) -> Self {
        let card_type = payload
            .get("card_type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { card_type, payload }
    }
}

// ── result ──────────────────────────────────────────────────────────

/// Terminal frame of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultEvent {
    #[serde(deserialize_with = "string_or_empty")]
    pub summary: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub yaml: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
    #[serde(deserialize_with = "string_or_empty")]
    pub risk_level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_review: bool,
    #[serde(deserialize_with = "string_or_empty")]
    pub draft_id: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub intent_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub questions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub plan: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub subagent_summaries: Vec<Value>,
    pub loop_metrics: Option<LoopMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopMetrics {
    #[serde(deserialize_with = "string_or_empty")]
    pub loop_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub iterations: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_calls: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_failures: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_ms: u64,
}

// ── error ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorEvent {
    #[serde(deserialize_with = "string_or_empty")]
    pub error: String,
}

// ── lenient field decoders ──────────────────────────────────────────

fn bool_or_none<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

fn u64_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64())
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
