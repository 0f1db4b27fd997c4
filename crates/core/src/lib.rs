//! BOPS Core - wire model of the agent workflow event stream
//!
//! Contains:
//! - Event payloads: status, message, delta, card, result, error
//! - SSE framing: frame decoder, chunk buffer, async frame reader
//! - Verbose side-channel: two-stage stream-finish decode
//! - Assembler configuration

mod config;
mod error;
mod event;
mod sse;
mod verbose;

pub use config::*;
pub use error::*;
pub use event::*;
pub use sse::*;
pub use verbose::*;
