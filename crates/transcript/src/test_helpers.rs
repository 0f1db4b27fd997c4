//! Shared frame builders for transcript tests.

use bops_core::{MessageExtra, MessageType, STREAM_PLUGIN_FINISH, StreamMessage};

pub fn mk_message(
    kind: MessageType,
    call_id: &str,
    content: &str,
    is_finish: Option<bool>,
) -> StreamMessage {
    StreamMessage {
        message_id: format!("msg-{}", call_id),
        reply_id: "reply-1".to_string(),
        role: "assistant".to_string(),
        kind,
        content: content.to_string(),
        is_finish,
        extra_info: MessageExtra {
            call_id: call_id.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn function_call(call_id: &str, content: &str, is_finish: Option<bool>) -> StreamMessage {
    mk_message(MessageType::FunctionCall, call_id, content, is_finish)
}

pub fn tool_response(call_id: &str, content: &str, is_finish: Option<bool>) -> StreamMessage {
    mk_message(MessageType::ToolResponse, call_id, content, is_finish)
}

pub fn looped(mut msg: StreamMessage, loop_id: &str, iteration: u64) -> StreamMessage {
    msg.extra_info.loop_id = loop_id.to_string();
    msg.extra_info.iteration = Some(iteration);
    msg
}

pub fn verbose_finish(uuid: &str, output: &str) -> StreamMessage {
    let data = serde_json::json!({ "uuid": uuid, "tool_output_content": output }).to_string();
    let content = serde_json::json!({ "msg_type": STREAM_PLUGIN_FINISH, "data": data }).to_string();
    let mut msg = mk_message(MessageType::Verbose, "executor", &content, Some(true));
    msg.extra_info.stream_plugin_running = uuid.to_string();
    msg
}

pub fn message_frame(msg: &StreamMessage) -> String {
    format!(
        "event: message\ndata: {}",
        serde_json::to_string(msg).expect("message serializes")
    )
}

pub fn delta_frame(channel: &str, content: &str) -> String {
    format!(
        "event: delta\ndata: {}",
        serde_json::json!({ "channel": channel, "content": content })
    )
}
