//! Workflow topology.
//!
//! ```text
//! planner -> researcher -> subject_writer -> preheader_writer -> body_writer
//!         -> aggregator -> qa_review
//! qa_review        --revise-->  subject_writer
//! qa_review        --approve--> html_renderer -> finalize_variant
//! finalize_variant --more-->    subject_writer
//! finalize_variant --quota-->   end
//! ```
//!
//! Routing is a pure function of the state. The engine decides nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::CampaignState;

/// Workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Planner,
    Researcher,
    SubjectWriter,
    PreheaderWriter,
    BodyWriter,
    Aggregator,
    QaReview,
    HtmlRenderer,
    FinalizeVariant,
}

impl NodeId {
    /// Entry point of every run.
    pub const ENTRY: Self = Self::Planner;

    pub const ALL: [Self; 9] = [
        Self::Planner,
        Self::Researcher,
        Self::SubjectWriter,
        Self::PreheaderWriter,
        Self::BodyWriter,
        Self::Aggregator,
        Self::QaReview,
        Self::HtmlRenderer,
        Self::FinalizeVariant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Researcher => "researcher",
            Self::SubjectWriter => "subject_writer",
            Self::PreheaderWriter => "preheader_writer",
            Self::BodyWriter => "body_writer",
            Self::Aggregator => "aggregator",
            Self::QaReview => "qa_review",
            Self::HtmlRenderer => "html_renderer",
            Self::FinalizeVariant => "finalize_variant",
        }
    }

    /// Whether the node calls a generation or retrieval service.
    pub fn is_external(&self) -> bool {
        !matches!(self, Self::Aggregator | Self::FinalizeVariant)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the workflow goes after a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Node(NodeId),
    End,
}

/// Post-QA routing.
///
/// Only parsed feedback that does not ask for revision reaches the renderer.
/// Missing or unreadable feedback goes back to the subject writer.
pub fn route_after_qa(state: &CampaignState) -> Next {
    match state.qa_feedback {
        Some(ref verdict) if verdict.is_approved() => Next::Node(NodeId::HtmlRenderer),
        _ => Next::Node(NodeId::SubjectWriter),
    }
}

/// Post-finalize routing: continue until `variants_per_tone * tones` variants exist.
pub fn route_after_finalize(state: &CampaignState) -> Next {
    if state.quota_met() {
        Next::End
    } else {
        Next::Node(NodeId::SubjectWriter)
    }
}

/// Transition table.
pub fn next_after(node: NodeId, state: &CampaignState) -> Next {
    match node {
        NodeId::Planner => Next::Node(NodeId::Researcher),
        NodeId::Researcher => Next::Node(NodeId::SubjectWriter),
        NodeId::SubjectWriter => Next::Node(NodeId::PreheaderWriter),
        NodeId::PreheaderWriter => Next::Node(NodeId::BodyWriter),
        NodeId::BodyWriter => Next::Node(NodeId::Aggregator),
        NodeId::Aggregator => Next::Node(NodeId::QaReview),
        NodeId::QaReview => route_after_qa(state),
        NodeId::HtmlRenderer => Next::Node(NodeId::FinalizeVariant),
        NodeId::FinalizeVariant => route_after_finalize(state),
    }
}
