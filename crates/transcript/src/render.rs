//! Plain-text transcript rendering for terminals and exports.

use serde_json::Value;

use crate::entry::{CallStatus, EntryBody, TranscriptEntry};

/// Convert entries to plain text, one block per entry.
pub fn render_plain_text(entries: &[TranscriptEntry]) -> String {
    let mut lines = Vec::new();
    for entry in entries {
        match &entry.body {
            EntryBody::Conversational { body, reasoning } => {
                lines.push(format!("{} [{}]:", entry.label, entry.id));
                if !reasoning.is_empty() {
                    lines.push("  Thinking:".to_string());
                    for l in reasoning.lines() {
                        lines.push(format!("    {}", l));
                    }
                }
                for l in body.lines() {
                    lines.push(format!("  {}", l));
                }
            }
            EntryBody::CallGroup { call } => {
                let icon = match call.status {
                    CallStatus::Running => "⟳",
                    CallStatus::Done => "✓",
                };
                lines.push(format!("[{}] {} {} ({})", entry.label, icon, call.title, call.call_id));
                if !call.content.is_empty() && call.content != call.title {
                    for l in call.content.lines() {
                        lines.push(format!("  {}", l));
                    }
                }
            }
            EntryBody::Card { card_type, card } => {
                let title = card.get("title").and_then(Value::as_str).unwrap_or("");
                lines.push(format!(
                    "[{}] {} {}",
                    entry.label,
                    card_type.as_deref().unwrap_or("unknown"),
                    title
                )
                .trim_end()
                .to_string());
            }
            EntryBody::Auxiliary {
                items, message, ..
            } => {
                match message {
                    Some(message) => lines.push(format!("[{}] {}", entry.label, message)),
                    None => lines.push(format!("[{}] {} item(s)", entry.label, items.len())),
                }
                for item in items {
                    lines.push(format!("  - {}", item_summary(item)));
                }
            }
        }
    }
    lines.join("\n")
}

fn item_summary(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["summary", "step_name", "title", "agent_name", "id"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}
