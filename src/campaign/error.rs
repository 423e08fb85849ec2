//! Campaign error types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::graph::NodeId;
use super::state::CampaignState;
use crate::ai::AIError;
use crate::core::Retryable;
use crate::retrieval::RetrievalError;

/// Artifacts produced by the content generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Plan,
    Research,
    SubjectLine,
    Preheader,
    Body,
    QaFeedback,
}

impl Artifact {
    /// Human readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "campaign plan",
            Self::Research => "research summary",
            Self::SubjectLine => "subject line",
            Self::Preheader => "preheader",
            Self::Body => "email body",
            Self::QaFeedback => "QA feedback",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An artifact failed its shape contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{artifact}: {reason}")]
pub struct ContractError {
    pub artifact: Artifact,
    pub reason: String,
}

impl ContractError {
    pub fn new(artifact: Artifact, reason: impl Into<String>) -> Self {
        Self { artifact, reason: reason.into() }
    }
}

/// Content generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The provider call itself failed.
    #[error("Generation failed: {0}")]
    Provider(#[from] AIError),

    /// The provider kept returning output outside the artifact's contract.
    #[error("{artifact} still out of contract after {attempts} attempt(s): {reason}")]
    ContractViolation { artifact: Artifact, reason: String, attempts: u32 },
}

/// Errors raised while running a campaign.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// QA feedback could not be interpreted; the variant goes back for revision.
    #[error("QA feedback could not be interpreted: {0}")]
    RoutingAmbiguity(String),

    /// Scratch fields were missing or inconsistent when a node needed them.
    #[error("Cannot assemble variant: {0}")]
    Aggregation(String),

    #[error("Variant rejected by QA {attempts} times, giving up")]
    RevisionLimitExceeded { attempts: u32 },

    #[error("Attempt timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Campaign run cancelled")]
    Cancelled,

    #[error("Invalid campaign input: {0}")]
    InvalidInput(String),

    #[error("Workflow exceeded {0} steps")]
    StepLimit(usize),
}

impl Retryable for CampaignError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Retrieval(_) | Self::Timeout { .. })
    }

    fn timed_out(after: Duration) -> Self {
        Self::Timeout { after }
    }
}

/// A run that stopped before reaching the end of the graph.
#[derive(Debug, thiserror::Error)]
#[error("Node '{node}' failed: {error}")]
pub struct RunError {
    /// Node that was running (or about to run) when the run stopped
    pub node: NodeId,

    /// Underlying cause
    #[source]
    pub error: CampaignError,

    /// Last committed state; the failing node's partial work is not in it
    pub state: Box<CampaignState>,
}

impl RunError {
    pub fn new(node: NodeId, error: CampaignError, state: CampaignState) -> Self {
        Self { node, error, state: Box::new(state) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let provider = CampaignError::Generation(GenerationError::Provider(AIError::NoResponse));
        assert!(provider.is_retryable());
        assert!(CampaignError::timed_out(Duration::from_secs(1)).is_retryable());

        assert!(!CampaignError::Cancelled.is_retryable());
        assert!(!CampaignError::Aggregation("no body".to_string()).is_retryable());
        assert!(!CampaignError::InvalidInput("no products".to_string()).is_retryable());
        assert!(!CampaignError::RevisionLimitExceeded { attempts: 6 }.is_retryable());
    }

    #[test]
    fn test_contract_violation_message() {
        let err = GenerationError::ContractViolation {
            artifact: Artifact::SubjectLine,
            reason: "61 characters, at most 50 allowed".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "subject line still out of contract after 3 attempt(s): 61 characters, at most 50 allowed"
        );
    }
}
