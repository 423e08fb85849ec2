//! Workflow engine.
//!
//! Drives a [`CampaignState`] through the graph in [`super::graph`], one node
//! at a time. Every node runs under its own [`RetryPolicy`] against a copy of
//! the committed state; only a successful attempt replaces it. A failure that
//! survives the policy stops the run with the last committed state attached.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{CampaignError, RunError};
use super::events::{EventSink, NullSink, ProgressEvent};
use super::generators::ContentGenerator;
use super::graph::{self, Next, NodeId};
use super::model::{ProductResearch, QaVerdict};
use super::prompts::{self, CopyContext};
use super::render;
use super::state::CampaignState;
use crate::core::{retry_async, CancelFlag, RetryPolicy};
use crate::retrieval::{DocumentStore, StoreId};

/// Retry policy per node.
#[derive(Debug, Clone)]
pub struct NodePolicies {
    default: RetryPolicy,
    overrides: HashMap<NodeId, RetryPolicy>,
}

impl NodePolicies {
    /// Use `policy` for every node that leaves the process; run the others once.
    pub fn uniform(policy: RetryPolicy) -> Self {
        let overrides = NodeId::ALL
            .into_iter()
            .filter(|node| !node.is_external())
            .map(|node| (node, RetryPolicy::none()))
            .collect();
        Self { default: policy, overrides }
    }

    /// Override the policy of a single node.
    pub fn with_policy(mut self, node: NodeId, policy: RetryPolicy) -> Self {
        self.overrides.insert(node, policy);
        self
    }

    pub fn policy_for(&self, node: NodeId) -> RetryPolicy {
        self.overrides.get(&node).copied().unwrap_or(self.default)
    }
}

impl Default for NodePolicies {
    fn default() -> Self {
        Self::uniform(RetryPolicy::default())
    }
}

/// Runs campaigns.
pub struct WorkflowEngine {
    generator: ContentGenerator,
    store: Arc<dyn DocumentStore>,
    policies: NodePolicies,
    max_revisions: u32,
    max_steps: Option<usize>,
    top_n: usize,
    cancel: CancelFlag,
    events: Arc<dyn EventSink>,
}

impl WorkflowEngine {
    /// Create an engine with default policies and a revision cap of 5.
    pub fn new(generator: ContentGenerator, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            generator,
            store,
            policies: NodePolicies::default(),
            max_revisions: 5,
            max_steps: None,
            top_n: 2,
            cancel: CancelFlag::new(),
            events: Arc::new(NullSink),
        }
    }

    pub fn with_policies(mut self, policies: NodePolicies) -> Self {
        self.policies = policies;
        self
    }

    /// QA rejections tolerated per variant before the run fails.
    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    /// Hard cap on node executions. Defaults to the most a run can need.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Documents requested per retrieval query.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Step budget: planner and researcher, then per variant every allowed
    /// review cycle (five nodes) plus rendering and finalizing.
    fn step_limit(&self, state: &CampaignState) -> usize {
        self.max_steps.unwrap_or_else(|| {
            let cycles = (self.max_revisions as usize).saturating_add(1);
            let per_variant = cycles.saturating_mul(5).saturating_add(2);
            state.quota().saturating_mul(per_variant).saturating_add(2)
        })
    }

    /// Run the campaign from the entry node to the end.
    pub async fn run(&self, mut state: CampaignState) -> Result<CampaignState, RunError> {
        let mut node = NodeId::ENTRY;
        let mut steps = 0;

        if let Err(e) = state.validate() {
            return Err(RunError::new(node, e, state));
        }
        let limit = self.step_limit(&state);

        tracing::info!(
            products = state.products.len(),
            tones = state.tones.len(),
            quota = state.quota(),
            provider = self.generator.provider_name(),
            store = self.store.name(),
            "Campaign started"
        );

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!(node = %node, "Run cancelled");
                return Err(RunError::new(node, CampaignError::Cancelled, state));
            }
            if steps >= limit {
                return Err(RunError::new(node, CampaignError::StepLimit(limit), state));
            }
            steps += 1;

            state = self.execute(node, state).await?;
            self.events.emit(ProgressEvent::new(node, state.clone()));

            match graph::next_after(node, &state) {
                Next::End => {
                    tracing::info!(variants = state.variants.len(), steps, "Campaign finished");
                    return Ok(state);
                }
                Next::Node(next) => {
                    if node == NodeId::QaReview && next == NodeId::SubjectWriter {
                        self.revise(&mut state).map_err(|e| RunError::new(node, e, state.clone()))?;
                    }
                    node = next;
                }
            }
        }
    }

    /// Run one node under its retry policy, committing only on success.
    async fn execute(&self, node: NodeId, state: CampaignState) -> Result<CampaignState, RunError> {
        let policy = self.policies.policy_for(node);
        tracing::info!(node = %node, tone = %state.current_tone, "Node started");

        let outcome = retry_async(
            &policy,
            |_attempt| self.run_node(node, state.clone()),
            |attempt, error| {
                tracing::warn!(node = %node, attempt, error = %error, "Node attempt failed, retrying");
            },
        )
        .await;

        let attempts = outcome.attempts;
        let elapsed_ms = outcome.total_time.as_millis() as u64;
        match outcome.into_result() {
            Ok(next) => {
                tracing::info!(node = %node, attempts, elapsed_ms, "Node completed");
                Ok(next)
            }
            Err(error) => {
                tracing::error!(node = %node, attempts, elapsed_ms, error = %error, "Node failed");
                Err(RunError::new(node, error, state))
            }
        }
    }

    /// Handle a QA rejection: enforce the cap, then discard the draft.
    fn revise(&self, state: &mut CampaignState) -> Result<(), CampaignError> {
        match state.qa_feedback {
            None => tracing::warn!("No QA feedback recorded, sending variant back for revision"),
            Some(QaVerdict::Unparsable(ref reason)) => tracing::warn!(
                error = %CampaignError::RoutingAmbiguity(reason.clone()),
                "Sending variant back for revision"
            ),
            Some(QaVerdict::Parsed(ref feedback)) => tracing::info!(
                rating = feedback.overall_rating,
                revision = state.revision_count + 1,
                "QA requested revision"
            ),
        }

        if state.revision_count >= self.max_revisions {
            return Err(CampaignError::RevisionLimitExceeded { attempts: state.revision_count + 1 });
        }
        state.begin_revision();
        Ok(())
    }

    /// Apply a single node to the state.
    pub async fn run_node(
        &self,
        node: NodeId,
        mut state: CampaignState,
    ) -> Result<CampaignState, CampaignError> {
        match node {
            NodeId::Planner => {
                state.campaign_plan = Some(self.generator.plan(&state.campaign_info).await?);
            }
            NodeId::Researcher => {
                state.research_findings = Some(self.research(&state).await?);
            }
            NodeId::SubjectWriter => {
                let ctx = CopyContext::from_state(&state)?;
                state.current_subject_line = Some(self.generator.subject_line(&ctx).await?);
            }
            NodeId::PreheaderWriter => {
                let ctx = CopyContext::from_state(&state)?;
                let subject = state.current_subject_line.as_ref().ok_or_else(|| {
                    CampaignError::Aggregation("preheader requested before subject line".to_string())
                })?;
                state.current_preheader = Some(self.generator.preheader(&ctx, subject).await?);
            }
            NodeId::BodyWriter => {
                let ctx = CopyContext::from_state(&state)?;
                state.current_body = Some(self.generator.body(&ctx).await?);
            }
            NodeId::Aggregator => state.aggregate()?,
            NodeId::QaReview => {
                let variant = state.current_variant.as_ref().ok_or_else(|| {
                    CampaignError::Aggregation("no variant to review".to_string())
                })?;
                let verdict = self.generator.qa_review(&state.campaign_info, variant).await?;
                state.qa_feedback = Some(verdict);
            }
            NodeId::HtmlRenderer => {
                let variant = state.current_variant.as_ref().ok_or_else(|| {
                    CampaignError::Aggregation("no variant to render".to_string())
                })?;
                state.html_email = Some(render::render_email(variant));
            }
            NodeId::FinalizeVariant => state.finalize()?,
        }
        Ok(state)
    }

    async fn research(&self, state: &CampaignState) -> Result<Vec<ProductResearch>, CampaignError> {
        let mut findings = Vec::with_capacity(state.products.len());

        for product in &state.products {
            let feature_query = prompts::feature_query(product);
            let features =
                self.store.search(StoreId::ProductFeatures, &feature_query, self.top_n).await?;

            let offer_query = prompts::offer_query(product);
            let offers = self.store.search(StoreId::Promotions, &offer_query, self.top_n).await?;

            if features.is_empty() && offers.is_empty() {
                tracing::warn!(product = %product.name, "No documents found, researching without context");
            }

            let research_data = prompts::retrieval_context(
                &feature_query,
                features.first().map(|d| d.text.as_str()),
            );
            let offers_data =
                prompts::retrieval_context(&offer_query, offers.first().map(|d| d.text.as_str()));

            findings.push(self.generator.research(product, &research_data, &offers_data).await?);
        }

        Ok(findings)
    }
}
