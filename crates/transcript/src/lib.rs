//! BOPS Transcript - incremental transcript assembly for agent event streams
//!
//! The assembler consumes decoded SSE frames one at a time and maintains an
//! ordered, append-only list of display entries:
//! - conversational entries fed by `answer` / `reasoning` deltas
//! - call-group entries showing the latest state of one tool call
//! - card entries carrying opaque card payloads
//! - auxiliary entries for plan, subagent summaries and errors
//!
//! Rendering is left to consumers; `render_plain_text` covers terminals.

mod assembler;
mod correlator;
mod delta;
mod entry;
mod lifecycle;
mod projector;
mod render;
mod store;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::*;
pub use correlator::*;
pub use delta::*;
pub use entry::*;
pub use lifecycle::*;
pub use projector::*;
pub use render::*;
pub use store::*;
