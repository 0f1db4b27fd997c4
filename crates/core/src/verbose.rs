//! Verbose side-channel decoding.
//!
//! A long-running sub-tool reports completion through a `verbose` message whose
//! `content` is a JSON string envelope `{"msg_type", "data"}`, and whose `data`
//! is itself a JSON string `{"uuid", "tool_output_content"}`. Both stages can
//! fail independently.

use serde_json::Value;
use thiserror::Error;

use crate::event::StreamMessage;

/// `msg_type` marking a finished stream plugin.
pub const STREAM_PLUGIN_FINISH: &str = "stream_plugin_finish";

/// A decoded stream-finish notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFinish {
    pub uuid: String,
    /// Final tool output, when the producer reported a non-empty one.
    pub output: Option<String>,
}

/// Why a verbose frame is not a usable stream-finish notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotStreamFinish {
    #[error("verbose message has no content")]
    EmptyContent,
    #[error("verbose envelope is not a JSON object")]
    MalformedEnvelope,
    #[error("verbose envelope has no msg_type")]
    MissingKind,
    #[error("verbose msg_type `{0}` is not a stream finish")]
    OtherKind(String),
    #[error("stream finish carries no uuid")]
    MissingUuid,
}

#[derive(Debug, Default)]
struct FinishData {
    uuid: String,
    tool_output_content: String,
}

impl FinishData {
    /// Each field is read on its own; a bad output never hides the uuid.
    fn from_value(data: Option<&Value>) -> Self {
        let parsed;
        let object = match data {
            Some(Value::String(raw)) => {
                parsed = serde_json::from_str::<Value>(raw).unwrap_or(Value::Null);
                &parsed
            }
            Some(value) => value,
            None => return Self::default(),
        };
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            uuid: field("uuid"),
            tool_output_content: field("tool_output_content"),
        }
    }
}

/// Two-stage decode of a verbose message into a stream-finish notification.
///
/// A malformed inner `data` degrades to "no inner data"; the uuid then falls
/// back to the outer `extra_info.stream_plugin_running`.
pub fn decode_stream_finish(message: &StreamMessage) -> Result<StreamFinish, NotStreamFinish> {
    if message.content.trim().is_empty() {
        return Err(NotStreamFinish::EmptyContent);
    }
    let envelope: Value = serde_json::from_str(&message.content)
        .map_err(|_| NotStreamFinish::MalformedEnvelope)?;
    let Value::Object(envelope) = envelope else {
        return Err(NotStreamFinish::MalformedEnvelope);
    };
    let kind = envelope
        .get("msg_type")
        .and_then(Value::as_str)
        .ok_or(NotStreamFinish::MissingKind)?;
    if kind != STREAM_PLUGIN_FINISH {
        return Err(NotStreamFinish::OtherKind(kind.to_string()));
    }

    let data = FinishData::from_value(envelope.get("data"));
    let uuid = if data.uuid.is_empty() {
        message.extra_info.stream_plugin_running.clone()
    } else {
        data.uuid
    };
    if uuid.is_empty() {
        return Err(NotStreamFinish::MissingUuid);
    }
    let output = Some(data.tool_output_content).filter(|s| !s.is_empty());
    Ok(StreamFinish { uuid, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MessageExtra, MessageType};

    fn verbose(content: &str, fallback_uuid: &str) -> StreamMessage {
        StreamMessage {
            kind: MessageType::Verbose,
            content: content.to_string(),
            extra_info: MessageExtra {
                stream_plugin_running: fallback_uuid.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn envelope(kind: &str, data: &str) -> String {
        serde_json::json!({ "msg_type": kind, "data": data }).to_string()
    }

    #[test]
    fn test_decodes_inner_uuid_and_output() {
        let inner = r#"{"uuid":"s-1","tool_output_content":"stream done"}"#;
        let finish = decode_stream_finish(&verbose(&envelope(STREAM_PLUGIN_FINISH, inner), ""))
            .unwrap();
        assert_eq!(finish.uuid, "s-1");
        assert_eq!(finish.output.as_deref(), Some("stream done"));
    }

    #[test]
    fn test_malformed_inner_data_falls_back_to_outer_uuid() {
        let msg = verbose(&envelope(STREAM_PLUGIN_FINISH, "{oops"), "outer-1");
        let finish = decode_stream_finish(&msg).unwrap();
        assert_eq!(finish.uuid, "outer-1");
        assert!(finish.output.is_none());
    }

    #[test]
    fn test_inner_data_as_object_is_accepted() {
        let content = serde_json::json!({
            "msg_type": STREAM_PLUGIN_FINISH,
            "data": { "uuid": "s-2", "tool_output_content": "" }
        })
        .to_string();
        let finish = decode_stream_finish(&verbose(&content, "")).unwrap();
        assert_eq!(finish.uuid, "s-2");
        assert!(finish.output.is_none());
    }

    #[test]
    fn test_inner_uuid_survives_non_string_output() {
        for inner in [
            r#"{"uuid":"s-1","tool_output_content":null}"#,
            r#"{"uuid":"s-1","tool_output_content":{"lines":3}}"#,
        ] {
            let finish =
                decode_stream_finish(&verbose(&envelope(STREAM_PLUGIN_FINISH, inner), ""))
                    .unwrap();
            assert_eq!(finish.uuid, "s-1");
            assert!(finish.output.is_none());
        }
    }

    #[test]
    fn test_rejections_are_typed() {
        assert_eq!(
            decode_stream_finish(&verbose("", "x")),
            Err(NotStreamFinish::EmptyContent)
        );
        assert_eq!(
            decode_stream_finish(&verbose("not json", "x")),
            Err(NotStreamFinish::MalformedEnvelope)
        );
        assert_eq!(
            decode_stream_finish(&verbose("[1,2]", "x")),
            Err(NotStreamFinish::MalformedEnvelope)
        );
        assert_eq!(
            decode_stream_finish(&verbose(r#"{"data":"{}"}"#, "x")),
            Err(NotStreamFinish::MissingKind)
        );
        assert_eq!(
            decode_stream_finish(&verbose(&envelope("tool_log", "{}"), "x")),
            Err(NotStreamFinish::OtherKind("tool_log".to_string()))
        );
        assert_eq!(
            decode_stream_finish(&verbose(&envelope(STREAM_PLUGIN_FINISH, "{}"), "")),
            Err(NotStreamFinish::MissingUuid)
        );
    }
}
