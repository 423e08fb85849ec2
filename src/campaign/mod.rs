//! Campaign generation workflow.
//!
//! A run plans the campaign, researches each product, then loops over
//! subject, preheader and body generation, QA review, and HTML rendering
//! until every tone has the requested number of approved variants.
//!
//! ```text
//! planner -> researcher -> [subject -> preheader -> body -> aggregate -> qa]
//!                             ^                                          |
//!                             +------------- revise ---------------------+
//!                             |                                          | approve
//!                             +--- more variants --- finalize <- html <--+
//! ```

mod catalog;
mod engine;
mod error;
mod events;
mod generators;
mod graph;
mod model;
mod prompts;
mod render;
mod report;
mod state;
mod tones;

pub use catalog::resolve_products;
pub use engine::{NodePolicies, WorkflowEngine};
pub use error::{Artifact, CampaignError, ContractError, GenerationError, RunError};
pub use events::{EventLog, EventSink, NullSink, ProgressEvent};
pub use generators::ContentGenerator;
pub use graph::{next_after, route_after_finalize, route_after_qa, Next, NodeId};
pub use model::{
    CampaignInput, EmailBody, EmailModule, EmailVariant, FinalizedVariant, Preheader, Product,
    ProductResearch, QaFeedback, QaVerdict, SubjectLine,
};
pub use prompts::CopyContext;
pub use render::{escape_html, render_email};
pub use report::{tone_slug, write_report, CampaignSummary};
pub use state::CampaignState;
pub use tones::ToneRotation;

use std::sync::Arc;

use crate::ai::GenerationProvider;
use crate::core::Config;
use crate::retrieval::DocumentStore;

/// Build an engine wired with the configured policies and limits.
pub fn engine_from_config(
    config: &Config,
    provider: Arc<dyn GenerationProvider>,
    store: Arc<dyn DocumentStore>,
) -> WorkflowEngine {
    let generator =
        ContentGenerator::new(provider).with_contract_attempts(config.campaign.contract_attempts);

    WorkflowEngine::new(generator, store)
        .with_policies(NodePolicies::uniform(config.retry.policy()))
        .with_max_revisions(config.campaign.max_revisions)
        .with_top_n(config.retrieval.top_n)
}

/// Initial state for a run using the configured tones.
pub fn initial_state(config: &Config, input: CampaignInput) -> Result<CampaignState, CampaignError> {
    let tones = ToneRotation::new(config.campaign.tones.clone())?;
    let state = CampaignState::new(input, tones);
    state.validate()?;
    Ok(state)
}
