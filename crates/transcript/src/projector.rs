//! Result/card projector: terminal payloads become standalone entries.

use bops_core::{CardEvent, ErrorEvent, LoopMetrics, ResultEvent};
use serde::Serialize;

use crate::entry::{AuxiliaryTopic, EntryBody, EntryId};
use crate::store::TranscriptStore;

/// Fixed labels recognised by downstream rendering.
pub const PLAN_LABEL: &str = "plan";
pub const SUBAGENT_SUMMARIES_LABEL: &str = "subagent summaries";

/// Run-level facts carried by the `result` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutcome {
    pub summary: String,
    pub yaml: String,
    pub issues: Vec<String>,
    pub risk_level: String,
    pub needs_review: bool,
    pub draft_id: String,
    pub intent_type: String,
    pub questions: Vec<String>,
    pub loop_metrics: Option<LoopMetrics>,
}

impl From<&ResultEvent> for RunOutcome {
    fn from(result: &ResultEvent) -> Self {
        Self {
            summary: result.summary.clone(),
            yaml: result.yaml.clone(),
            issues: result.issues.clone(),
            risk_level: result.risk_level.clone(),
            needs_review: result.needs_review,
            draft_id: result.draft_id.clone(),
            intent_type: result.intent_type.clone(),
            questions: result.questions.clone(),
            loop_metrics: result.loop_metrics.clone(),
        }
    }
}

/// Every card becomes a new entry carrying the raw payload.
pub fn project_card(store: &mut TranscriptStore, card: &CardEvent, label: &str) -> EntryId {
    store.push(label, EntryBody::Card {
        card_type: card.card_type.clone(),
        card: card.payload.clone(),
    })
}

/// Plan and subagent summaries each become an entry when non-empty.
pub fn project_result(store: &mut TranscriptStore, result: &ResultEvent) -> Vec<EntryId> {
    let mut created = Vec::new();
    if !result.plan.is_empty() {
        created.push(store.push(PLAN_LABEL, EntryBody::Auxiliary {
            topic: AuxiliaryTopic::Plan,
            items: result.plan.clone(),
            message: None,
        }));
    }
    if !result.subagent_summaries.is_empty() {
        created.push(store.push(SUBAGENT_SUMMARIES_LABEL, EntryBody::Auxiliary {
            topic: AuxiliaryTopic::SubagentSummaries,
            items: result.subagent_summaries.clone(),
            message: None,
        }));
    }
    created
}

pub fn project_error(store: &mut TranscriptStore, error: &ErrorEvent, label: &str) -> Option<EntryId> {
    let message = error.error.trim();
    if message.is_empty() {
        return None;
    }
    Some(store.push(label, EntryBody::Auxiliary {
        topic: AuxiliaryTopic::Error,
        items: Vec::new(),
        message: Some(message.to_string()),
    }))
}
