//! Server-sent event framing.
//!
//! A frame is a block of lines terminated by a blank line. `event:` sets the
//! event name (default `message`), `data:` lines are concatenated into one
//! JSON payload.

use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::FrameError;
use crate::event::{EVENT_MESSAGE, StreamEvent};

/// Raw frame split into its event name and concatenated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

impl Frame {
    /// Split a raw frame; `None` when the frame carries no data.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut event = EVENT_MESSAGE.to_string();
        let mut data = String::new();
        for line in raw.split('\n') {
            let line = line.trim_end_matches('\r');
            if let Some(name) = line.strip_prefix("event:") {
                let name = name.trim();
                if !name.is_empty() {
                    event = name.to_string();
                }
            } else if let Some(chunk) = line.strip_prefix("data:") {
                data.push_str(chunk.trim());
            }
        }
        if data.is_empty() {
            return None;
        }
        Some(Self { event, data })
    }

    pub fn decode(&self) -> Result<StreamEvent, FrameError> {
        StreamEvent::from_parts(&self.event, &self.data).map_err(|source| {
            FrameError::MalformedPayload {
                event: self.event.clone(),
                source,
            }
        })
    }
}

/// Decode one raw frame into a typed event.
///
/// `Ok(None)` means the frame had no `data:` line.
pub fn decode_frame(raw: &str) -> Result<Option<StreamEvent>, FrameError> {
    match Frame::parse(raw) {
        Some(frame) => frame.decode().map(Some),
        None => Ok(None),
    }
}

/// Accumulates transport chunks and yields complete frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, returning every frame completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        if self.pending.contains('\r') {
            self.pending = self.pending.replace("\r\n", "\n");
        }
        let mut frames = Vec::new();
        while let Some(pos) = self.pending.find("\n\n") {
            let frame: String = self.pending.drain(..pos + 2).collect();
            let frame = &frame[..pos];
            if !frame.trim().is_empty() {
                frames.push(frame.to_string());
            }
        }
        frames
    }

    /// Flush the trailing frame when the stream ends without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest.trim_end_matches('\n').to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Pulls raw frames out of an async line source.
pub struct FrameReader<R> {
    reader: R,
    buffer: FrameBuffer,
    ready: VecDeque<String>,
    eof: bool,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::new(),
            ready: VecDeque::new(),
            eof: false,
        }
    }

    /// Next raw frame, or `None` once the source is exhausted.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        while self.ready.is_empty() && !self.eof {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                self.eof = true;
                self.ready.extend(self.buffer.finish());
            } else {
                self.ready.extend(self.buffer.push(&line));
            }
        }
        Ok(self.ready.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DeltaChannel, MessageType};

    #[test]
    fn test_parse_defaults_event_name_to_message() {
        let frame = Frame::parse("data: {\"type\":\"function_call\"}").unwrap();
        assert_eq!(frame.event, "message");
        assert_eq!(frame.data, "{\"type\":\"function_call\"}");
    }

    #[test]
    fn test_parse_concatenates_data_lines() {
        let frame = Frame::parse("event: delta\ndata: {\"channel\":\ndata: \"answer\"}\n").unwrap();
        assert_eq!(frame.event, "delta");
        assert_eq!(frame.data, "{\"channel\":\"answer\"}");
        let Ok(StreamEvent::Delta(delta)) = frame.decode() else {
            panic!("expected delta event");
        };
        assert_eq!(delta.channel, DeltaChannel::Answer);
    }

    #[test]
    fn test_parse_without_data_is_none() {
        assert!(Frame::parse("event: status\n: keepalive").is_none());
        assert!(decode_frame("event: status").unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_payload_is_error() {
        let err = decode_frame("event: message\ndata: {not json").unwrap_err();
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn test_decode_message_frame() {
        let event = decode_frame(
            "event: message\r\ndata: {\"type\":\"verbose\",\"content\":\"{}\"}\r\n",
        )
        .unwrap()
        .unwrap();
        let StreamEvent::Message(msg) = event else {
            panic!("expected message event");
        };
        assert_eq!(msg.kind, MessageType::Verbose);
    }

    #[test]
    fn test_buffer_splits_across_chunks() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push("event: delta\ndata: {\"a\"").is_empty());
        let frames = buffer.push(":1}\n\nevent: card\n");
        assert_eq!(frames, vec!["event: delta\ndata: {\"a\":1}".to_string()]);
        let frames = buffer.push("data: {}\r");
        assert!(frames.is_empty());
        let frames = buffer.push("\n\r\n");
        assert_eq!(frames, vec!["event: card\ndata: {}".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_skips_blank_frames_and_flushes_tail() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push("\n\n\n\n").is_empty());
        assert!(buffer.push("data: {}\n").is_empty());
        assert_eq!(buffer.finish().as_deref(), Some("data: {}"));
        assert!(buffer.finish().is_none());
    }

    #[tokio::test]
    async fn test_reader_yields_frames_in_order() {
        let input = "event: status\ndata: {}\n\nevent: delta\ndata: {\"channel\":\"answer\"}\n\ndata: {}";
        let mut reader = FrameReader::new(tokio::io::BufReader::new(input.as_bytes()));
        let first = reader.next_frame().await.unwrap().unwrap();
        assert!(first.starts_with("event: status"));
        let second = reader.next_frame().await.unwrap().unwrap();
        assert!(second.starts_with("event: delta"));
        let third = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(third, "data: {}");
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
